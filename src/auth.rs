//! Per-thread authorization for deadlock prevention.
//!
//! An [`Authorization`] tracks how many locks its thread currently holds and
//! refuses any new acquisition that could close a waits-for cycle. It does
//! not track *which* containers are held, only counts and kinds; the price of
//! that economy is that some safe acquisitions are refused as well. A caller
//! that is refused must release everything it holds and retry.
//!
//! The decision procedure lives in a [`Policy`]. Every lock kind has a
//! matching policy (see [`MatchedPolicy`](crate::lock::MatchedPolicy)), but a
//! thread can use any single policy against containers of mixed lock kinds;
//! the lock tells the policy everything it needs to know through a
//! [`LockRequest`].

use {
    crate::lock::{Count, Order, ORDER_UNORDERED},
    static_assertions::assert_not_impl_any,
    std::{
        cell::RefCell,
        fmt::{Debug, Formatter},
        rc::Rc,
    },
};

mod policies;

pub use policies::{
    DenyAll, ExclusiveTracking, MultiReadOneWrite, OrderedPolicy, ReadOnly, UntrackedSingle,
};


/// Everything a lock knows about an acquisition attempt at the moment it
/// consults the policy.
///
/// The lock builds the request while holding its internal mutex, so the
/// fields form one consistent snapshot; there is no gap between the check and
/// the registration. Decorator policies may *relax* `lock_out` and
/// `must_block` before delegating to their inner policy, which is why the
/// request travels by mutable reference.
#[derive(Copy, Clone, Debug)]
pub struct LockRequest {
    /// Exclusive access is being requested.
    pub write: bool,
    /// The caller is willing to wait for the lock.
    pub blocking: bool,
    /// Another thread has begun waiting for exclusive access on this lock.
    pub lock_out: bool,
    /// Granting the request would require the caller to wait right now.
    pub must_block: bool,
    /// The lock's configured order, [`ORDER_UNORDERED`] for unordered locks.
    pub order: Order,
}

/// The counterpart of [`LockRequest`] for releasing a recorded holding.
#[derive(Copy, Clone, Debug)]
pub struct UnlockRequest {
    /// The holding was registered as exclusive.
    pub write: bool,
    /// The lock's configured order.
    pub order: Order,
}

/// A per-thread deadlock-prevention state machine.
///
/// Policies never block and complete in bounded time; they are called while
/// the requesting lock's internal mutex is held and must never re-enter a
/// lock.
pub trait Policy {
    /// Whether this policy understands locks of the given order.
    ///
    /// Policies without order tracking only authorize unordered locks, since
    /// they could not uphold the ordering discipline.
    fn order_allowed(&self, order: Order) -> bool {
        order == ORDER_UNORDERED
    }

    /// The admission predicate.
    ///
    /// Decorators may relax fields of `request` before delegating, so the
    /// request is mutable even though plain policies only read it.
    fn test(&self, request: &mut LockRequest) -> bool;

    /// Tests the request and, on success, records the holding.
    fn register(&mut self, request: &mut LockRequest) -> bool;

    /// Forgets a holding previously recorded by `register`.
    ///
    /// Releasing more than was registered is a caller bug; it is reported
    /// with a debug assertion and otherwise ignored.
    fn release(&mut self, request: &UnlockRequest);

    /// Number of shared holdings currently recorded.
    fn reading_count(&self) -> Count {
        0
    }

    /// Number of exclusive holdings currently recorded.
    fn writing_count(&self) -> Count {
        0
    }
}

/// A thread's authorization handle.
///
/// Create one per thread, either from a container with
/// [`Protected::new_authorization`](crate::Protected::new_authorization) or
/// directly from a policy with [`Authorization::new`], and pass it to the
/// `_auth` and `_multi` acquisition methods. The handle is intentionally
/// neither [`Send`] nor [`Sync`]: its book-keeping only describes a single
/// thread, so the type system keeps it on one.
///
/// Clones share the same counters. Proxy handles keep a clone for as long as
/// they hold their lock, so the release always reaches the counters that
/// admitted the acquisition, even if the caller drops its own handle first.
///
/// # Example
///
/// ```
/// use custody::Protected;
///
/// let value: Protected<i32> = Protected::new(10);
/// let auth = value.new_authorization();
///
/// let read = value.get_read_auth(&auth).unwrap();
/// assert_eq!(auth.reading_count(), 1);
///
/// // Waiting for a write while this thread still reads could deadlock.
/// assert!(value.get_write_auth(&auth).is_none());
///
/// drop(read);
/// assert_eq!(auth.reading_count(), 0);
/// assert!(value.get_write_auth(&auth).is_some());
/// ```
#[derive(Clone)]
pub struct Authorization {
    shared: Rc<Shared>,
}

struct Shared {
    policy: RefCell<Box<dyn Policy>>,
}

assert_not_impl_any!(Authorization: Send, Sync);

impl Authorization {
    /// Creates an authorization driven by the given policy.
    ///
    /// # Example
    ///
    /// ```
    /// use custody::{auth::{Authorization, ExclusiveTracking}, Protected};
    ///
    /// let value: Protected<i32> = Protected::new(0);
    /// // A stricter policy than the container's own: at most one lock of
    /// // any kind at a time.
    /// let auth = Authorization::new(ExclusiveTracking::default());
    /// let read = value.get_read_auth(&auth).unwrap();
    /// assert_eq!(auth.writing_count(), 1);
    /// ```
    pub fn new(policy: impl Policy + 'static) -> Self {
        Self {
            shared: Rc::new(Shared {
                policy: RefCell::new(Box::new(policy)),
            }),
        }
    }

    /// Number of shared holdings this thread has registered and not yet
    /// released.
    pub fn reading_count(&self) -> Count {
        self.shared.policy.borrow().reading_count()
    }

    /// Number of exclusive holdings this thread has registered and not yet
    /// released.
    pub fn writing_count(&self) -> Count {
        self.shared.policy.borrow().writing_count()
    }

    /// Predicts whether a shared acquisition with the given attributes would
    /// be admitted, without registering anything.
    ///
    /// Pass `lock_out = true, must_block = true` for the most pessimistic
    /// guess.
    pub fn guess_read_allowed(&self, lock_out: bool, must_block: bool, order: Order) -> bool {
        self.guess(false, lock_out, must_block, order)
    }

    /// Predicts whether an exclusive acquisition with the given attributes
    /// would be admitted, without registering anything.
    pub fn guess_write_allowed(&self, lock_out: bool, must_block: bool, order: Order) -> bool {
        self.guess(true, lock_out, must_block, order)
    }

    fn guess(&self, write: bool, lock_out: bool, must_block: bool, order: Order) -> bool {
        let mut request = LockRequest {
            write,
            blocking: true,
            lock_out,
            must_block,
            order,
        };
        let policy = self.shared.policy.borrow();
        policy.order_allowed(order) && policy.test(&mut request)
    }

    /// The combined register-or-test entry point used by the lock state
    /// machines.
    pub(crate) fn admit(&self, request: &mut LockRequest, test: bool) -> bool {
        let mut policy = self.shared.policy.borrow_mut();
        if !policy.order_allowed(request.order) {
            return false;
        }
        if test {
            policy.test(request)
        } else {
            policy.register(request)
        }
    }

    pub(crate) fn retire(&self, request: &UnlockRequest) {
        self.shared.policy.borrow_mut().release(request);
    }

    /// Identity of this authorization, used by the writer-reads check.
    /// Stable for as long as any clone is alive, and never 0.
    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.shared) as usize
    }
}

impl Debug for Authorization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorization")
            .field("id", &self.id())
            .field("reading", &self.reading_count())
            .field("writing", &self.writing_count())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Authorization {
    /// Two handles are equal when they share the same counters.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Authorization {}
