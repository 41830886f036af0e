use {
    crate::{
        auth::Authorization,
        cell::{ValueCell, ValueRead, ValueWrite},
        lock::{Count, Mode, RawLock, SharedExclusive},
    },
    static_assertions::assert_not_impl_any,
    std::{
        fmt::{Debug, Formatter},
        ptr,
        rc::Rc,
    },
};


/// The shared release token behind every proxy handle.
///
/// All copies of a proxy hold the same `Grant` through an [`Rc`]; the last
/// copy to drop releases the container lock and then the meta share, each
/// informing the authorization exactly once.
pub(crate) struct Grant<'a, T: ?Sized> {
    cell: &'a ValueCell<T>,
    lock: &'a (dyn RawLock + 'a),
    meta: Option<&'a SharedExclusive>,
    auth: Option<Authorization>,
    mode: Mode,
    lock_count: Count,
}

impl<'a, T: ?Sized> Grant<'a, T> {
    /// The combined meta + container acquisition.
    ///
    /// The meta-lock is entered shared first, in test mode, so that nested
    /// meta shares never count against the policy; then the container lock
    /// is acquired for real. If the container lock is denied, the meta share
    /// is rolled back and nothing has changed.
    pub(crate) fn acquire(
        cell: &'a ValueCell<T>,
        lock: &'a (dyn RawLock + 'a),
        meta: Option<&'a SharedExclusive>,
        auth: Option<&Authorization>,
        mode: Mode,
        blocking: bool,
    ) -> Option<Rc<Self>> {
        if let Some(meta) = meta {
            meta.acquire(auth, Mode::Read, blocking, true)?;
        }
        let lock_count = match lock.acquire(auth, mode, blocking, false) {
            Some(count) => count,
            None => {
                if let Some(meta) = meta {
                    meta.release(auth, Mode::Read, true);
                }
                return None;
            }
        };
        Some(Rc::new(Grant {
            cell,
            lock,
            meta,
            auth: auth.cloned(),
            mode,
            lock_count,
        }))
    }

    pub(crate) fn lock_count(&self) -> Count {
        self.lock_count
    }
}

impl<T: ?Sized> Drop for Grant<'_, T> {
    fn drop(&mut self) {
        // Container lock first, meta share last; the reverse of acquisition.
        self.lock.release(self.auth.as_ref(), self.mode, false);
        if let Some(meta) = self.meta {
            meta.release(self.auth.as_ref(), Mode::Read, true);
        }
    }
}

/// An exclusive proxy to the value of a [`Protected`](crate::Protected)
/// container.
///
/// The proxy holds the container's lock for its whole life. It can be cloned
/// freely within its thread; all clones share one grant, and the lock is
/// released when the last clone goes away. The value itself is reached
/// through the short-lived [`read`](Self::read) and [`write`](Self::write)
/// guards.
///
/// # Example
///
/// ```
/// use custody::Protected;
///
/// let value: Protected<Vec<i32>> = Protected::new(vec![1, 2]);
/// let proxy = value.get_write().unwrap();
/// proxy.write().push(3);
/// assert_eq!(proxy.read().len(), 3);
/// drop(proxy);
/// ```
pub struct WriteProxy<'a, T: ?Sized> {
    grant: Rc<Grant<'a, T>>,
}

/// A shared proxy to the value of a [`Protected`](crate::Protected)
/// container.
///
/// Like [`WriteProxy`], but the value can only be read.
pub struct ReadProxy<'a, T: ?Sized> {
    grant: Rc<Grant<'a, T>>,
}

assert_not_impl_any!(WriteProxy<'_, u8>: Send, Sync);
assert_not_impl_any!(ReadProxy<'_, u8>: Send, Sync);

impl<'a, T: ?Sized> WriteProxy<'a, T> {
    pub(crate) fn new(grant: Rc<Grant<'a, T>>) -> Self {
        debug_assert_eq!(grant.mode, Mode::Write);
        Self { grant }
    }

    /// Shared access to the value.
    ///
    /// # Panic
    ///
    /// Panics if a [`ValueWrite`] guard for the same container is alive.
    pub fn read<'s>(&'s self) -> ValueRead<'s, T> {
        self.grant.cell.borrow_shared()
    }

    /// Shared access to the value, refusing instead of panicking on a
    /// conflicting guard.
    pub fn try_read<'s>(&'s self) -> Option<ValueRead<'s, T>> {
        self.grant.cell.try_borrow_shared()
    }

    /// Exclusive access to the value.
    ///
    /// # Panic
    ///
    /// Panics if any other guard for the same container is alive.
    pub fn write<'s>(&'s self) -> ValueWrite<'s, T> {
        self.grant.cell.borrow_exclusive()
    }

    /// Exclusive access to the value, refusing instead of panicking on a
    /// conflicting guard.
    pub fn try_write<'s>(&'s self) -> Option<ValueWrite<'s, T>> {
        self.grant.cell.try_borrow_exclusive()
    }

    /// Drops this copy of the proxy. The lock is released when the last copy
    /// is gone.
    pub fn clear(self) {}

    /// The number of shared grants observed when the lock was acquired;
    /// always 0 for an exclusive grant. Mostly useful for diagnostics.
    pub fn last_lock_count(&self) -> Count {
        self.grant.lock_count
    }
}

impl<'a, T: ?Sized> ReadProxy<'a, T> {
    pub(crate) fn new(grant: Rc<Grant<'a, T>>) -> Self {
        debug_assert_eq!(grant.mode, Mode::Read);
        Self { grant }
    }

    /// Shared access to the value.
    ///
    /// # Panic
    ///
    /// Panics if a [`ValueWrite`] guard for the same container is alive,
    /// which can only happen under the writer-reads rule.
    pub fn read<'s>(&'s self) -> ValueRead<'s, T> {
        self.grant.cell.borrow_shared()
    }

    /// Shared access to the value, refusing instead of panicking on a
    /// conflicting guard.
    pub fn try_read<'s>(&'s self) -> Option<ValueRead<'s, T>> {
        self.grant.cell.try_borrow_shared()
    }

    /// Drops this copy of the proxy. The lock is released when the last copy
    /// is gone.
    pub fn clear(self) {}

    /// The number of shared grants observed when the lock was acquired.
    /// Mostly useful for diagnostics.
    pub fn last_lock_count(&self) -> Count {
        self.grant.lock_count
    }
}

impl<T: ?Sized> Clone for WriteProxy<'_, T> {
    fn clone(&self) -> Self {
        Self {
            grant: self.grant.clone(),
        }
    }
}

impl<T: ?Sized> Clone for ReadProxy<'_, T> {
    fn clone(&self) -> Self {
        Self {
            grant: self.grant.clone(),
        }
    }
}

impl<T: ?Sized> Debug for WriteProxy<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteProxy")
            .field("last_lock_count", &self.grant.lock_count)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> Debug for ReadProxy<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadProxy")
            .field("last_lock_count", &self.grant.lock_count)
            .finish_non_exhaustive()
    }
}

// Equality of proxies is identity of the value they point at.

impl<T: ?Sized> PartialEq for WriteProxy<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.grant.cell, other.grant.cell)
    }
}

impl<T: ?Sized> Eq for WriteProxy<'_, T> {}

impl<T: ?Sized> PartialEq for ReadProxy<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.grant.cell, other.grant.cell)
    }
}

impl<T: ?Sized> Eq for ReadProxy<'_, T> {}

impl<T: ?Sized> PartialEq<ReadProxy<'_, T>> for WriteProxy<'_, T> {
    fn eq(&self, other: &ReadProxy<'_, T>) -> bool {
        ptr::eq(self.grant.cell, other.grant.cell)
    }
}

impl<T: ?Sized> PartialEq<WriteProxy<'_, T>> for ReadProxy<'_, T> {
    fn eq(&self, other: &WriteProxy<'_, T>) -> bool {
        ptr::eq(self.grant.cell, other.grant.cell)
    }
}
