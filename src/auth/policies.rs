use {
    super::{LockRequest, Policy, UnlockRequest},
    crate::lock::{Count, Order, ORDER_UNORDERED},
    std::collections::BTreeSet,
};

#[cfg(test)]
mod tests;

/// Partner policy of [`SharedExclusive`](crate::lock::SharedExclusive):
/// the thread may hold any number of shared locks, or one exclusive lock,
/// but not both.
///
/// Exceptions: a lock that would be granted without waiting is always
/// admitted when nothing is queued behind it, a non-blocking exclusive
/// request is always admitted (failure to acquire cannot leave the thread
/// waiting), and the writer-reads rule lets the holder of an exclusive grant
/// register shared grants on the same container.
#[derive(Default, Debug)]
pub struct MultiReadOneWrite {
    reading: Count,
    writing: Count,
}

impl Policy for MultiReadOneWrite {
    fn test(&self, request: &mut LockRequest) -> bool {
        // An exclusive attempt that will not wait can never close a cycle.
        if request.write && !request.blocking {
            return true;
        }
        if self.writing > 0 && request.must_block {
            return false;
        }
        if self.reading > 0 && request.write && request.must_block {
            return false;
        }
        if (self.reading > 0 || self.writing > 0) && request.lock_out {
            return false;
        }
        true
    }

    fn register(&mut self, request: &mut LockRequest) -> bool {
        if !self.test(request) {
            return false;
        }
        if request.write {
            self.writing += 1;
        } else {
            self.reading += 1;
        }
        true
    }

    fn release(&mut self, request: &UnlockRequest) {
        if request.write {
            debug_assert!(self.writing > 0);
            self.writing = self.writing.saturating_sub(1);
        } else {
            debug_assert!(self.reading > 0);
            self.reading = self.reading.saturating_sub(1);
        }
    }

    fn reading_count(&self) -> Count {
        self.reading
    }

    fn writing_count(&self) -> Count {
        self.writing
    }
}

impl Drop for MultiReadOneWrite {
    fn drop(&mut self) {
        debug_assert!(
            self.reading == 0 && self.writing == 0,
            "authorization dropped with outstanding holdings",
        );
    }
}

/// Partner policy of [`SharedOnly`](crate::lock::SharedOnly): any number of
/// shared locks, never an exclusive lock.
///
/// Useful to guarantee that a thread cannot write to any container at all.
#[derive(Default, Debug)]
pub struct ReadOnly {
    reading: Count,
}

impl Policy for ReadOnly {
    fn test(&self, request: &mut LockRequest) -> bool {
        if request.write {
            return false;
        }
        if self.reading > 0 && request.lock_out {
            return false;
        }
        true
    }

    fn register(&mut self, request: &mut LockRequest) -> bool {
        if !self.test(request) {
            return false;
        }
        self.reading += 1;
        true
    }

    fn release(&mut self, request: &UnlockRequest) {
        debug_assert!(!request.write);
        debug_assert!(self.reading > 0);
        self.reading = self.reading.saturating_sub(1);
    }

    fn reading_count(&self) -> Count {
        self.reading
    }
}

impl Drop for ReadOnly {
    fn drop(&mut self) {
        debug_assert!(
            self.reading == 0,
            "authorization dropped with outstanding holdings",
        );
    }
}

/// Partner policy of [`ExclusiveOnly`](crate::lock::ExclusiveOnly): every
/// grant counts as exclusive, and a second lock is only admitted while the
/// first container is idle.
#[derive(Default, Debug)]
pub struct ExclusiveTracking {
    writing: Count,
}

impl Policy for ExclusiveTracking {
    fn test(&self, request: &mut LockRequest) -> bool {
        !(self.writing > 0 && request.must_block)
    }

    fn register(&mut self, request: &mut LockRequest) -> bool {
        if !self.test(request) {
            return false;
        }
        self.writing += 1;
        true
    }

    fn release(&mut self, _request: &UnlockRequest) {
        debug_assert!(self.writing > 0);
        self.writing = self.writing.saturating_sub(1);
    }

    fn writing_count(&self) -> Count {
        self.writing
    }
}

impl Drop for ExclusiveTracking {
    fn drop(&mut self) {
        debug_assert!(
            self.writing == 0,
            "authorization dropped with outstanding holdings",
        );
    }
}

/// Partner policy of [`Untracked`](crate::lock::Untracked): strictly one
/// lock at a time, whether or not the target container is in use.
///
/// The one loophole is [`SharedOnly`](crate::lock::SharedOnly) containers,
/// which report themselves as never in use; this policy still refuses them
/// once it holds anything.
#[derive(Default, Debug)]
pub struct UntrackedSingle {
    writing: bool,
}

impl Policy for UntrackedSingle {
    fn test(&self, _request: &mut LockRequest) -> bool {
        !self.writing
    }

    fn register(&mut self, request: &mut LockRequest) -> bool {
        if !self.test(request) {
            return false;
        }
        self.writing = true;
        true
    }

    fn release(&mut self, _request: &UnlockRequest) {
        debug_assert!(self.writing);
        self.writing = false;
    }

    fn writing_count(&self) -> Count {
        self.writing as Count
    }
}

impl Drop for UntrackedSingle {
    fn drop(&mut self) {
        debug_assert!(
            !self.writing,
            "authorization dropped with outstanding holdings",
        );
    }
}

/// Partner policy of [`Broken`](crate::lock::Broken): admits nothing.
#[derive(Default, Debug)]
pub struct DenyAll;

impl Policy for DenyAll {
    fn test(&self, _request: &mut LockRequest) -> bool {
        false
    }

    fn register(&mut self, _request: &mut LockRequest) -> bool {
        false
    }

    fn release(&mut self, _request: &UnlockRequest) {
        debug_assert!(false, "release on a policy that never grants");
    }
}

/// Decorates any policy with order tracking, the partner of
/// [`Ordered`](crate::lock::Ordered) locks.
///
/// Unordered acquisitions behave exactly as the inner policy dictates. For
/// ordered acquisitions the decorator enforces a strict ascending discipline:
/// as long as the thread holds no unordered locks and every held order is
/// strictly below the requested one, waiting for the lock cannot close a
/// cycle, so `lock_out` and `must_block` are cleared before the inner policy
/// is consulted. Requests that break the discipline fall back to the inner
/// policy's full rules.
#[derive(Default, Debug)]
pub struct OrderedPolicy<P> {
    inner: P,
    ordered: BTreeSet<Order>,
    unordered: Count,
}

impl<P> OrderedPolicy<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            ordered: BTreeSet::new(),
            unordered: 0,
        }
    }

    /// Largest order currently held, if any.
    pub fn max_held_order(&self) -> Option<Order> {
        self.ordered.iter().next_back().copied()
    }

    fn relax(&self, request: &mut LockRequest) {
        if request.order == ORDER_UNORDERED {
            return;
        }
        let normal_rules = self.unordered > 0
            || self
                .max_held_order()
                .is_some_and(|max| max >= request.order);
        if !normal_rules {
            // A strictly greater order may wait unconditionally.
            request.lock_out = false;
            request.must_block = false;
        }
    }
}

impl<P: Policy> Policy for OrderedPolicy<P> {
    fn order_allowed(&self, _order: Order) -> bool {
        true
    }

    fn test(&self, request: &mut LockRequest) -> bool {
        self.relax(request);
        self.inner.test(request)
    }

    fn register(&mut self, request: &mut LockRequest) -> bool {
        self.relax(request);
        if !self.inner.register(request) {
            return false;
        }
        if request.order == ORDER_UNORDERED {
            self.unordered += 1;
        } else {
            let inserted = self.ordered.insert(request.order);
            debug_assert!(inserted, "an order can only be held once at a time");
        }
        true
    }

    fn release(&mut self, request: &UnlockRequest) {
        if request.order == ORDER_UNORDERED {
            debug_assert!(self.unordered > 0);
            self.unordered = self.unordered.saturating_sub(1);
        } else {
            let removed = self.ordered.remove(&request.order);
            debug_assert!(removed, "released an order that was not held");
        }
        self.inner.release(request);
    }

    fn reading_count(&self) -> Count {
        self.inner.reading_count()
    }

    fn writing_count(&self) -> Count {
        self.inner.writing_count()
    }
}

impl<P> Drop for OrderedPolicy<P> {
    fn drop(&mut self) {
        debug_assert!(
            self.unordered == 0 && self.ordered.is_empty(),
            "authorization dropped with outstanding holdings",
        );
    }
}
