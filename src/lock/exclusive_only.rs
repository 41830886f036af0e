use {
    super::{
        register_or_test, release_registration, Count, Mode, Order, OrderableLock, RawLock,
        ORDER_UNORDERED,
    },
    crate::{
        auth::{Authorization, ExclusiveTracking, LockRequest, UnlockRequest},
        thread_token::thread_token,
    },
    parking_lot::{Condvar, Mutex},
};

#[cfg(test)]
mod tests;

/// A lock with a single holder and no shared mode.
///
/// Shared and exclusive requests are the same thing here, so the policy is
/// always consulted for exclusive access, whatever the caller asked for.
/// Runs ahead of [`SharedExclusive`](super::SharedExclusive) when shared
/// access is never needed.
pub struct ExclusiveOnly {
    state: Mutex<State>,
    write_wait: Condvar,
}

struct State {
    writer: bool,
    writers_waiting: Count,
    /// Thread token of the holder, for release-side checks.
    owner: usize,
}

impl ExclusiveOnly {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State {
                writer: false,
                writers_waiting: 0,
                owner: 0,
            }),
            write_wait: Condvar::new(),
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
        let mut state = self.state.lock();
        let mut request = LockRequest {
            write: true,
            blocking,
            lock_out: state.writer || state.writers_waiting > 0,
            must_block: state.writer,
            order,
        };
        if !register_or_test(auth, &mut request, test) {
            return None;
        }
        if !blocking && state.writer {
            if !test {
                release_registration(auth, &UnlockRequest { write: true, order });
            }
            return None;
        }
        state.writers_waiting += 1;
        while state.writer {
            self.write_wait.wait(&mut state);
        }
        state.writers_waiting -= 1;
        state.writer = true;
        state.owner = thread_token();
        Some(0)
    }

    pub(super) fn unlock_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        _mode: Mode,
        test: bool,
    ) -> Option<Count> {
        let mut state = self.state.lock();
        if !state.writer {
            debug_assert!(false, "release without a grant");
            return None;
        }
        debug_assert_eq!(state.owner, thread_token(), "released by a non-holder");
        if !test {
            release_registration(auth, &UnlockRequest { write: true, order });
        }
        state.writer = false;
        state.owner = 0;
        if state.writers_waiting > 0 {
            self.write_wait.notify_all();
        }
        Some(0)
    }
}

impl Default for ExclusiveOnly {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for ExclusiveOnly {
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

impl super::sealed::Sealed for ExclusiveOnly {}

impl OrderableLock for ExclusiveOnly {
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

impl super::MatchedPolicy for ExclusiveOnly {
    type Policy = ExclusiveTracking;
}

impl Drop for ExclusiveOnly {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        debug_assert!(
            !state.writer && state.writers_waiting == 0,
            "lock dropped while held",
        );
    }
}
