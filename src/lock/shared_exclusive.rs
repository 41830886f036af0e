use {
    super::{
        identity_of, register_or_test, release_registration, Count, Mode, Order, OrderableLock,
        RawLock, ORDER_UNORDERED,
    },
    crate::auth::{Authorization, LockRequest, MultiReadOneWrite, UnlockRequest},
    parking_lot::{Condvar, Mutex},
    std::mem,
};


/// The canonical shared/exclusive lock with writer priority.
///
/// Any number of shared grants coexist. An exclusive request first queues
/// behind other exclusive requests, then announces itself (`writer_waiting`),
/// which locks out every later shared request until it has drained the
/// current readers and taken the lock. Ties between exclusive requests are
/// broken by arrival at the internal mutex.
///
/// The one exception to the writer exclusion is the writer-reads rule: while
/// a thread holds the exclusive grant, shared requests arriving with the same
/// authorization identity are granted immediately. This lets a writer observe
/// the value it just wrote, and it is what keeps multi-lock sequences through
/// a [`MetaLock`](crate::MetaLock) from blocking on themselves. Such grants
/// survive the exclusive release as ordinary shared grants.
pub struct SharedExclusive {
    state: Mutex<State>,
    read_wait: Condvar,
    write_wait: Condvar,
}

struct State {
    readers: Count,
    /// Threads blocked on `read_wait`: shared acquirers plus exclusive
    /// acquirers still queueing for their turn to announce.
    readers_waiting: Count,
    writer: bool,
    writer_waiting: bool,
    /// Shared grants the current writer gave itself.
    writer_reads: Count,
    /// Identity of the writer's authorization; 0 when there is no writer or
    /// the writer brought no authorization.
    writer_identity: usize,
}

impl SharedExclusive {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State {
                readers: 0,
                readers_waiting: 0,
                writer: false,
                writer_waiting: false,
                writer_reads: 0,
                writer_identity: 0,
            }),
            read_wait: Condvar::new(),
            write_wait: Condvar::new(),
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
        let mut state = self.state.lock();

        let identity = identity_of(auth);
        let writer_read =
            mode == Mode::Read && identity != 0 && state.writer && state.writer_identity == identity;
        let must_block = match mode {
            Mode::Read => state.writer || state.writer_waiting,
            Mode::Write => state.writer || state.writer_waiting || state.readers > 0,
        };
        let (lock_out, must_block) = if writer_read {
            // The writer observing its own value never waits and never
            // counts against its policy's exclusion flags.
            (false, false)
        } else {
            (state.writer_waiting, must_block)
        };

        let mut request = LockRequest {
            write: mode.is_write(),
            blocking,
            lock_out,
            must_block,
            order,
        };
        if !register_or_test(auth, &mut request, test) {
            return None;
        }

        if writer_read {
            state.writer_reads += 1;
            return Some(state.readers + state.writer_reads);
        }

        if !blocking && must_block {
            if !test {
                release_registration(
                    auth,
                    &UnlockRequest {
                        write: request.write,
                        order,
                    },
                );
            }
            return None;
        }

        match mode {
            Mode::Read => {
                state.readers_waiting += 1;
                while state.writer || state.writer_waiting {
                    self.read_wait.wait(&mut state);
                }
                state.readers_waiting -= 1;
                state.readers += 1;
                Some(state.readers)
            }
            Mode::Write => {
                // Queue until no other writer is announced, then announce.
                // An exclusive release broadcasts `read_wait`, which is what
                // moves the next queued writer forward.
                state.readers_waiting += 1;
                while state.writer_waiting {
                    self.read_wait.wait(&mut state);
                }
                state.readers_waiting -= 1;
                state.writer_waiting = true;
                while state.writer || state.readers > 0 {
                    self.write_wait.wait(&mut state);
                }
                state.writer_waiting = false;
                state.writer = true;
                state.writer_identity = identity;
                debug_assert_eq!(state.writer_reads, 0);
                Some(0)
            }
        }
    }

    pub(super) fn unlock_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        mode: Mode,
        test: bool,
    ) -> Option<Count> {
        let mut state = self.state.lock();
        if !test {
            release_registration(
                auth,
                &UnlockRequest {
                    write: mode.is_write(),
                    order,
                },
            );
        }
        match mode {
            Mode::Read => {
                let identity = identity_of(auth);
                if state.writer && identity != 0 && state.writer_identity == identity {
                    if state.writer_reads == 0 {
                        debug_assert!(false, "shared release without a shared grant");
                        return None;
                    }
                    state.writer_reads -= 1;
                    return Some(state.readers + state.writer_reads);
                }
                debug_assert!(!state.writer);
                if state.readers == 0 {
                    debug_assert!(false, "shared release without a shared grant");
                    return None;
                }
                state.readers -= 1;
                if state.readers == 0 && state.writer_waiting {
                    self.write_wait.notify_all();
                }
                Some(state.readers)
            }
            Mode::Write => {
                if !state.writer {
                    debug_assert!(false, "exclusive release without the exclusive grant");
                    return None;
                }
                debug_assert_eq!(state.readers, 0);
                state.writer = false;
                state.writer_identity = 0;
                // Writer-reads grants outlive the exclusive grant as plain
                // shared grants; an announced writer keeps waiting for them.
                state.readers += mem::take(&mut state.writer_reads);
                if state.writer_waiting {
                    self.write_wait.notify_all();
                }
                if state.readers_waiting > 0 {
                    self.read_wait.notify_all();
                }
                Some(0)
            }
        }
    }
}

impl Default for SharedExclusive {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for SharedExclusive {
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

impl super::sealed::Sealed for SharedExclusive {}

impl OrderableLock for SharedExclusive {
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

impl super::MatchedPolicy for SharedExclusive {
    type Policy = MultiReadOneWrite;
}

impl Drop for SharedExclusive {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        debug_assert!(
            state.readers == 0
                && state.readers_waiting == 0
                && !state.writer
                && !state.writer_waiting
                && state.writer_reads == 0,
            "lock dropped while held",
        );
    }
}
