use {
    super::{
        register_or_test, release_registration, Count, Mode, Order, OrderableLock, RawLock,
        ORDER_UNORDERED,
    },
    crate::{
        auth::{Authorization, LockRequest, UnlockRequest, UntrackedSingle},
        thread_token::thread_token,
    },
    parking_lot::{
        lock_api::RawMutex as RawMutexTrait,
        RawMutex,
    },
    std::sync::atomic::{AtomicUsize, Ordering::Relaxed},
};


/// A plain mutex with no book-keeping.
///
/// It cannot tell whether other threads are queued, so it reports the most
/// pessimistic picture to the policy: always in use, always locked out. In
/// combination with any tracking policy that means a thread holding anything
/// else will almost always be refused, and a container with this lock can
/// never take part in a multi-lock sequence.
///
/// Shared and exclusive requests are the same thing here.
pub struct Untracked {
    raw: RawMutex,
    /// Thread token of the holder; releases from any other thread are
    /// refused, which keeps the raw unlock sound.
    owner: AtomicUsize,
}

impl Untracked {
    pub const fn new() -> Self {
        Self {
            raw: RawMutex::INIT,
            owner: AtomicUsize::new(0),
        }
    }

    pub(super) fn lock_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        _mode: Mode,
        blocking: bool,
        test: bool,
    ) -> Option<Count> {
        let mut request = LockRequest {
            write: true,
            blocking,
            lock_out: true,
            must_block: true,
            order,
        };
        if !register_or_test(auth, &mut request, test) {
            return None;
        }
        if blocking {
            self.raw.lock();
        } else if !self.raw.try_lock() {
            if !test {
                release_registration(auth, &UnlockRequest { write: true, order });
            }
            return None;
        }
        self.owner.store(thread_token(), Relaxed);
        Some(0)
    }

    pub(super) fn unlock_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        _mode: Mode,
        test: bool,
    ) -> Option<Count> {
        // Releases from a thread that does not hold the mutex are refused;
        // anything else would make the raw unlock unsound.
        if self.owner.load(Relaxed) != thread_token() {
            return None;
        }
        self.owner.store(0, Relaxed);
        if !test {
            release_registration(auth, &UnlockRequest { write: true, order });
        }
        // SAFETY: - The owner field matched the current thread's token, so
        //           this thread is the one that locked the mutex.
        unsafe {
            self.raw.unlock();
        }
        Some(0)
    }
}

impl Default for Untracked {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for Untracked {
    fn acquire(
        &self,
        auth: Option<&Authorization>,
        mode: Mode,
        blocking: bool,
        test: bool,
    ) -> Option<Count> {
        self.lock_at(ORDER_UNORDERED, auth, mode, blocking, test)
    }

    fn release(&self, auth: Option<&Authorization>, mode: Mode, test: bool) -> Option<Count> {
        self.unlock_at(ORDER_UNORDERED, auth, mode, test)
    }
}

impl super::sealed::Sealed for Untracked {}

impl OrderableLock for Untracked {
    fn acquire_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        mode: Mode,
        blocking: bool,
        test: bool,
    ) -> Option<Count> {
        self.lock_at(order, auth, mode, blocking, test)
    }

    fn release_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        mode: Mode,
        test: bool,
    ) -> Option<Count> {
        self.unlock_at(order, auth, mode, test)
    }
}

impl super::MatchedPolicy for Untracked {
    type Policy = UntrackedSingle;
}

impl Drop for Untracked {
    fn drop(&mut self) {
        debug_assert!(!self.raw.is_locked(), "lock dropped while held");
    }
}
