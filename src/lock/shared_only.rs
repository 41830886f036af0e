use {
    super::{
        register_or_test, release_registration, Count, Mode, Order, OrderableLock, RawLock,
        ORDER_UNORDERED,
    },
    crate::auth::{Authorization, LockRequest, ReadOnly, UnlockRequest},
    std::sync::atomic::{
        AtomicUsize,
        Ordering::{AcqRel, Acquire},
    },
};

#[cfg(test)]
mod tests;

/// A lock that grants shared access only.
///
/// There is no exclusive mode, so there is nothing to wait for and nothing
/// that could take part in a waits-for cycle; the whole lock is one atomic
/// count. The policy is still consulted (a policy that refuses everything
/// must be able to refuse here too), but always with the most permissive
/// flags. Exclusive requests are denied outright.
pub struct SharedOnly {
    readers: AtomicUsize,
}

impl SharedOnly {
    pub const fn new() -> Self {
        Self {
            readers: AtomicUsize::new(0),
        }
    }

    pub(super) fn lock_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        mode: Mode,
        blocking: bool,
        test: bool,
    ) -> Option<Count> {
        if mode.is_write() {
            return None;
        }
        let mut request = LockRequest {
            write: false,
            blocking,
            lock_out: false,
            must_block: false,
            order,
        };
        if !register_or_test(auth, &mut request, test) {
            return None;
        }
        let readers = self.readers.fetch_add(1, AcqRel) + 1;
        debug_assert!(readers > 0);
        Some(readers)
    }

    pub(super) fn unlock_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        mode: Mode,
        test: bool,
    ) -> Option<Count> {
        if mode.is_write() {
            return None;
        }
        match self
            .readers
            .fetch_update(AcqRel, Acquire, |readers| readers.checked_sub(1))
        {
            Ok(previous) => {
                if !test {
                    release_registration(
                        auth,
                        &UnlockRequest {
                            write: false,
                            order,
                        },
                    );
                }
                Some(previous - 1)
            }
            Err(_) => {
                debug_assert!(false, "shared release without a grant");
                None
            }
        }
    }
}

impl Default for SharedOnly {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for SharedOnly {
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

impl super::sealed::Sealed for SharedOnly {}

impl OrderableLock for SharedOnly {
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

impl super::MatchedPolicy for SharedOnly {
    type Policy = ReadOnly;
}

impl Drop for SharedOnly {
    fn drop(&mut self) {
        debug_assert_eq!(*self.readers.get_mut(), 0, "lock dropped while held");
    }
}
