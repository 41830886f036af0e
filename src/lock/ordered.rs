use {
    super::{Count, MatchedPolicy, Mode, Order, OrderableLock, RawLock},
    crate::auth::{Authorization, OrderedPolicy},
};

#[cfg(test)]
mod tests;

/// Wraps another lock kind with an acquisition order.
///
/// Orders support the second escape hatch for holding several exclusive
/// locks at once: give every container a distinct order and acquire in
/// strictly ascending order. An
/// [`OrderedPolicy`](crate::auth::OrderedPolicy) authorization then waives
/// its usual restrictions for requests whose order is strictly above
/// everything the thread already holds, because such a wait can never close
/// a cycle.
///
/// Order 0 is "unordered": the wrapper then behaves exactly as the inner
/// lock. The ordering discipline is meaningless without tracking, so this
/// lock refuses every operation that arrives without an authorization, and
/// unordered policies in turn refuse ordered locks.
///
/// # Example
///
/// ```
/// use custody::{lock::{Ordered, SharedExclusive}, Protected};
///
/// let first = Protected::with_lock(1, Ordered::new(SharedExclusive::new(), 1));
/// let second = Protected::with_lock(2, Ordered::new(SharedExclusive::new(), 2));
/// assert_eq!(first.order(), 1);
///
/// let auth = first.new_authorization();
/// let a = first.get_write_auth(&auth).unwrap();
/// // Ascending, so waiting is authorized even though `a` is still held.
/// let b = second.get_write_auth(&auth).unwrap();
/// assert_eq!(auth.writing_count(), 2);
/// drop((a, b));
/// ```
pub struct Ordered<L> {
    inner: L,
    order: Order,
}

impl<L> Ordered<L> {
    pub const fn new(inner: L, order: Order) -> Self {
        Self { inner, order }
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: OrderableLock> RawLock for Ordered<L> {
    fn acquire(
        &self,
        auth: Option<&Authorization>,
        mode: Mode,
        blocking: bool,
        test: bool,
    ) -> Option<Count> {
        // The ordering discipline cannot be upheld for untracked callers.
        auth?;
        self.inner.acquire_at(self.order, auth, mode, blocking, test)
    }

    fn release(&self, auth: Option<&Authorization>, mode: Mode, test: bool) -> Option<Count> {
        auth?;
        self.inner.release_at(self.order, auth, mode, test)
    }

    fn order(&self) -> Order {
        self.order
    }
}

impl<L> MatchedPolicy for Ordered<L>
where
    L: OrderableLock + MatchedPolicy,
{
    type Policy = OrderedPolicy<L::Policy>;
}
