//! The lock state machines behind [`Protected`](crate::Protected).
//!
//! Every kind implements the same [`RawLock`] contract; they differ in which
//! modes they grant, how much they track, and therefore how well they
//! cooperate with deadlock prevention:
//!
//! - [`SharedExclusive`]: many readers or one writer, writer priority, and
//!   the writer-reads rule. The default.
//! - [`ExclusiveOnly`]: one holder at a time; faster when shared access is
//!   never needed. Every request counts as exclusive.
//! - [`SharedOnly`]: readers only, a bare atomic count; never blocks.
//! - [`Untracked`]: a plain mutex with no book-keeping, so it must assume
//!   the worst when asked; it cannot take part in multi-locking.
//! - [`Broken`]: never grants; for pathological test setups.
//! - [`Ordered`]: wraps one of the above with an acquisition order for the
//!   ascending-order locking discipline.

use crate::auth::{Authorization, LockRequest, UnlockRequest};

mod broken;
mod exclusive_only;
mod ordered;
mod shared_exclusive;
mod shared_only;
mod untracked;

pub use {
    broken::Broken, exclusive_only::ExclusiveOnly, ordered::Ordered,
    shared_exclusive::SharedExclusive, shared_only::SharedOnly, untracked::Untracked,
};

/// Number of shared holders reported by lock operations.
pub type Count = usize;

/// Acquisition order of an ordered lock.
pub type Order = u64;

/// The order reported by every unordered lock.
pub const ORDER_UNORDERED: Order = 0;

/// Requested access mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

impl Mode {
    #[inline]
    pub fn is_write(self) -> bool {
        matches!(self, Mode::Write)
    }
}

/// The uniform contract of all lock kinds.
///
/// `acquire` consults the authorization (if any) through a single combined
/// register-or-test call while the lock's internal mutex is held, then
/// evaluates its own blocking condition, waits if it may, and returns the
/// resulting shared count (0 for exclusive grants). `None` means denied:
/// either the policy refused, or a non-blocking call would have had to wait.
/// A denied acquisition leaves every counter untouched.
///
/// `test == true` asks for the policy to be consulted without being updated;
/// the meta-lock's shared entries use this so that they never count against
/// the policy. A release with `test == true` correspondingly skips the
/// policy.
///
/// Releasing a grant that was never acquired is a caller bug: it is reported
/// with a debug assertion and answered with `None` in release builds.
pub trait RawLock {
    fn acquire(
        &self,
        auth: Option<&Authorization>,
        mode: Mode,
        blocking: bool,
        test: bool,
    ) -> Option<Count>;

    fn release(&self, auth: Option<&Authorization>, mode: Mode, test: bool) -> Option<Count>;

    /// The lock's configured order; [`ORDER_UNORDERED`] unless wrapped by
    /// [`Ordered`].
    fn order(&self) -> Order {
        ORDER_UNORDERED
    }
}

/// Associates a lock kind with the policy that understands it, used by
/// [`Protected::new_authorization`](crate::Protected::new_authorization).
pub trait MatchedPolicy: RawLock {
    type Policy: crate::auth::Policy + Default + 'static;
}

mod sealed {
    pub trait Sealed {}
}

/// Lock kinds that [`Ordered`] can wrap.
///
/// The wrapper threads its configured order through these entry points so
/// the policy can apply the ordering discipline. This trait is sealed; the
/// set of base lock kinds is closed.
pub trait OrderableLock: RawLock + sealed::Sealed {
    #[doc(hidden)]
    fn acquire_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        mode: Mode,
        blocking: bool,
        test: bool,
    ) -> Option<Count>;

    #[doc(hidden)]
    fn release_at(
        &self,
        order: Order,
        auth: Option<&Authorization>,
        mode: Mode,
        test: bool,
    ) -> Option<Count>;
}

#[inline]
fn register_or_test(auth: Option<&Authorization>, request: &mut LockRequest, test: bool) -> bool {
    match auth {
        None => true,
        Some(auth) => auth.admit(request, test),
    }
}

#[inline]
fn release_registration(auth: Option<&Authorization>, request: &UnlockRequest) {
    if let Some(auth) = auth {
        auth.retire(request);
    }
}

#[inline]
fn identity_of(auth: Option<&Authorization>) -> usize {
    auth.map_or(0, Authorization::id)
}
