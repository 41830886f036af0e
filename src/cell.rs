use {
    static_assertions::assert_not_impl_any,
    std::{
        cell::UnsafeCell,
        ops::{Deref, DerefMut},
        sync::atomic::{
            AtomicUsize,
            Ordering::{Acquire, Relaxed, Release},
        },
    },
};


/// Ledger value marking an exclusive borrow.
const EXCLUSIVE: usize = usize::MAX;

/// Storage for a protected value: the value itself plus a borrow ledger.
///
/// The lock state machines guarantee that at most one thread can reach the
/// value exclusively, and that shared access excludes exclusive access across
/// threads. The one situation they deliberately allow to overlap is the
/// writer-reads rule: the thread holding an exclusive grant may also hold
/// shared grants on the same container. The ledger turns that overlap into a
/// checked borrow: every access goes through a short-lived [`ValueRead`] or
/// [`ValueWrite`] guard, and conflicting guards are refused at runtime instead
/// of aliasing the value.
pub(crate) struct ValueCell<T: ?Sized> {
    borrows: AtomicUsize,
    value: UnsafeCell<T>,
}

assert_not_impl_any!(ValueCell<u8>: Sync);

impl<T> ValueCell<T> {
    #[inline]
    pub(crate) const fn new(value: T) -> Self {
        Self {
            borrows: AtomicUsize::new(0),
            value: UnsafeCell::new(value),
        }
    }

    #[inline]
    pub(crate) fn into_inner(self) -> T {
        debug_assert_eq!(self.borrows.load(Relaxed), 0);
        self.value.into_inner()
    }
}

impl<T: ?Sized> ValueCell<T> {
    #[inline]
    pub(crate) fn get_mut(&mut self) -> &mut T {
        debug_assert_eq!(*self.borrows.get_mut(), 0);
        self.value.get_mut()
    }

    /// Takes a shared entry in the ledger.
    pub(crate) fn try_borrow_shared(&self) -> Option<ValueRead<'_, T>> {
        let mut current = self.borrows.load(Relaxed);
        loop {
            if current == EXCLUSIVE {
                return None;
            }
            assert_ne!(current, EXCLUSIVE - 1, "shared borrow count overflow");
            match self
                .borrows
                .compare_exchange_weak(current, current + 1, Acquire, Relaxed)
            {
                Ok(_) => return Some(ValueRead { cell: self }),
                Err(seen) => current = seen,
            }
        }
    }

    pub(crate) fn borrow_shared(&self) -> ValueRead<'_, T> {
        match self.try_borrow_shared() {
            Some(read) => read,
            None => panic!("value is being written through another proxy"),
        }
    }

    /// Takes the exclusive entry in the ledger.
    pub(crate) fn try_borrow_exclusive(&self) -> Option<ValueWrite<'_, T>> {
        self.borrows
            .compare_exchange(0, EXCLUSIVE, Acquire, Relaxed)
            .is_ok()
            .then(|| ValueWrite { cell: self })
    }

    pub(crate) fn borrow_exclusive(&self) -> ValueWrite<'_, T> {
        match self.try_borrow_exclusive() {
            Some(write) => write,
            None => panic!("value is already borrowed through another proxy"),
        }
    }
}

/// Shared access to a protected value, checked in and out of the container's
/// borrow ledger.
///
/// Created by the `read` methods of the proxy handles. The guard must be
/// dropped before any exclusive access to the same container can succeed.
pub struct ValueRead<'a, T: ?Sized> {
    cell: &'a ValueCell<T>,
}

/// Exclusive access to a protected value, checked in and out of the
/// container's borrow ledger.
///
/// Created by the `write` methods of write proxies. While the guard lives,
/// every other access to the same container's value is refused.
pub struct ValueWrite<'a, T: ?Sized> {
    cell: &'a ValueCell<T>,
}

impl<T: ?Sized> Deref for ValueRead<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: - This guard holds a shared ledger entry, so no ValueWrite
        //           exists for the cell and none can be created while the
        //           entry is held.
        //         - Therefore no exclusive reference to the value is alive.
        unsafe { &*self.cell.value.get() }
    }
}

impl<T: ?Sized> Drop for ValueRead<'_, T> {
    #[inline]
    fn drop(&mut self) {
        let previous = self.cell.borrows.fetch_sub(1, Release);
        debug_assert!(previous != 0 && previous != EXCLUSIVE);
    }
}

impl<T: ?Sized> Deref for ValueWrite<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: - This guard holds the exclusive ledger entry, so no other
        //           guard for the cell is alive.
        unsafe { &*self.cell.value.get() }
    }
}

impl<T: ?Sized> DerefMut for ValueWrite<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: - This guard holds the exclusive ledger entry, so no other
        //           guard for the cell is alive.
        //         - The mutable borrow of the guard ensures that no reference
        //           previously returned by deref is alive either.
        unsafe { &mut *self.cell.value.get() }
    }
}

impl<T: ?Sized> Drop for ValueWrite<'_, T> {
    #[inline]
    fn drop(&mut self) {
        let previous = self.cell.borrows.swap(0, Release);
        debug_assert_eq!(previous, EXCLUSIVE);
    }
}
