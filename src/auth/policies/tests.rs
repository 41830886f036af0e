use crate::{
    auth::{
        DenyAll, ExclusiveTracking, LockRequest, MultiReadOneWrite, OrderedPolicy, Policy,
        ReadOnly, UnlockRequest, UntrackedSingle,
    },
    lock::{Order, ORDER_UNORDERED},
};

fn request(write: bool, lock_out: bool, must_block: bool) -> LockRequest {
    LockRequest {
        write,
        blocking: true,
        lock_out,
        must_block,
        order: ORDER_UNORDERED,
    }
}

fn ordered_request(write: bool, lock_out: bool, must_block: bool, order: Order) -> LockRequest {
    LockRequest {
        write,
        blocking: true,
        lock_out,
        must_block,
        order,
    }
}

fn unlock(write: bool) -> UnlockRequest {
    UnlockRequest {
        write,
        order: ORDER_UNORDERED,
    }
}

fn ordered_unlock(write: bool, order: Order) -> UnlockRequest {
    UnlockRequest { write, order }
}

#[test]
fn multi_read_one_write_reads() {
    let mut policy = MultiReadOneWrite::default();
    assert!(policy.register(&mut request(false, false, false)));
    assert!(policy.register(&mut request(false, false, false)));
    assert_eq!(policy.reading_count(), 2);
    // More reads are fine, unless a writer is waiting somewhere.
    assert!(policy.test(&mut request(false, false, false)));
    assert!(!policy.test(&mut request(false, true, false)));
    // A write while reads are held must not wait.
    assert!(!policy.test(&mut request(true, false, true)));
    assert!(policy.test(&mut request(true, false, false)));
    policy.release(&unlock(false));
    policy.release(&unlock(false));
    assert_eq!(policy.reading_count(), 0);
}

#[test]
fn multi_read_one_write_writes() {
    let mut policy = MultiReadOneWrite::default();
    assert!(policy.register(&mut request(true, false, false)));
    assert_eq!(policy.writing_count(), 1);
    // Anything on a busy container is refused while a write is held.
    assert!(!policy.test(&mut request(false, false, true)));
    assert!(!policy.test(&mut request(true, false, true)));
    assert!(!policy.test(&mut request(false, true, false)));
    // An idle container is fine.
    assert!(policy.test(&mut request(false, false, false)));
    assert!(policy.test(&mut request(true, false, false)));
    policy.release(&unlock(true));
    assert_eq!(policy.writing_count(), 0);
}

#[test]
fn nonblocking_write_always_admitted() {
    let mut policy = MultiReadOneWrite::default();
    assert!(policy.register(&mut request(false, false, false)));
    let mut nonblocking = LockRequest {
        write: true,
        blocking: false,
        lock_out: true,
        must_block: true,
        order: ORDER_UNORDERED,
    };
    // A write attempt that will not wait cannot close a cycle, so it is
    // admitted even with a read held and the worst flags.
    assert!(policy.test(&mut nonblocking));
    assert!(policy.register(&mut nonblocking));
    policy.release(&unlock(true));
    policy.release(&unlock(false));
}

#[test]
fn read_only_never_writes() {
    let mut policy = ReadOnly::default();
    assert!(!policy.test(&mut request(true, false, false)));
    assert!(policy.register(&mut request(false, true, true)));
    assert_eq!(policy.reading_count(), 1);
    // A second read is refused once a writer is waiting somewhere.
    assert!(!policy.test(&mut request(false, true, false)));
    assert!(policy.test(&mut request(false, false, true)));
    policy.release(&unlock(false));
}

#[test]
fn exclusive_tracking() {
    let mut policy = ExclusiveTracking::default();
    assert!(policy.register(&mut request(true, false, false)));
    assert_eq!(policy.writing_count(), 1);
    // A second lock is only admitted for an idle container.
    assert!(!policy.test(&mut request(true, false, true)));
    assert!(policy.register(&mut request(true, true, false)));
    assert_eq!(policy.writing_count(), 2);
    policy.release(&unlock(true));
    policy.release(&unlock(true));
}

#[test]
fn untracked_single() {
    let mut policy = UntrackedSingle::default();
    assert!(policy.register(&mut request(true, true, true)));
    assert_eq!(policy.writing_count(), 1);
    // One lock, full stop; even an idle container is refused.
    assert!(!policy.test(&mut request(true, false, false)));
    assert!(!policy.test(&mut request(false, false, false)));
    policy.release(&unlock(true));
    assert_eq!(policy.writing_count(), 0);
}

#[test]
fn deny_all() {
    let mut policy = DenyAll;
    assert!(!policy.test(&mut request(false, false, false)));
    assert!(!policy.register(&mut request(true, false, false)));
}

#[test]
fn unordered_policies_refuse_ordered_locks() {
    assert!(!MultiReadOneWrite::default().order_allowed(1));
    assert!(!ReadOnly::default().order_allowed(1));
    assert!(!ExclusiveTracking::default().order_allowed(1));
    assert!(!UntrackedSingle::default().order_allowed(1));
    assert!(MultiReadOneWrite::default().order_allowed(ORDER_UNORDERED));
    assert!(OrderedPolicy::<MultiReadOneWrite>::default().order_allowed(1));
}

#[test]
fn ordered_ascending_is_relaxed() {
    let mut policy = OrderedPolicy::<MultiReadOneWrite>::default();
    assert!(policy.register(&mut ordered_request(true, true, true, 1)));
    // Strictly greater order: admitted even though the container is busy
    // and a write is already held.
    assert!(policy.register(&mut ordered_request(true, true, true, 2)));
    assert_eq!(policy.writing_count(), 2);
    assert_eq!(policy.max_held_order(), Some(2));
    policy.release(&ordered_unlock(true, 2));
    policy.release(&ordered_unlock(true, 1));
    assert_eq!(policy.max_held_order(), None);
}

#[test]
fn ordered_descending_falls_back_to_inner_rules() {
    let mut policy = OrderedPolicy::<MultiReadOneWrite>::default();
    assert!(policy.register(&mut ordered_request(true, false, false, 3)));
    // Not strictly greater: the inner policy sees the real flags and
    // refuses the busy container.
    assert!(!policy.test(&mut ordered_request(true, false, true, 2)));
    assert!(!policy.test(&mut ordered_request(true, false, true, 3)));
    // An idle container is still fine, order rules or not.
    assert!(policy.test(&mut ordered_request(true, false, false, 2)));
    policy.release(&ordered_unlock(true, 3));
}

#[test]
fn ordered_unordered_holdings_disable_relaxation() {
    let mut policy = OrderedPolicy::<MultiReadOneWrite>::default();
    assert!(policy.register(&mut ordered_request(true, false, false, ORDER_UNORDERED)));
    // With an unordered lock held, even an ascending request obeys the
    // inner policy's full rules.
    assert!(!policy.test(&mut ordered_request(true, false, true, 5)));
    assert!(policy.test(&mut ordered_request(true, false, false, 5)));
    policy.release(&ordered_unlock(true, ORDER_UNORDERED));
}

#[test]
fn ordered_request_flags_are_relaxed_in_place() {
    let policy = {
        let mut policy = OrderedPolicy::<MultiReadOneWrite>::default();
        assert!(policy.register(&mut ordered_request(false, false, false, 1)));
        policy
    };
    let mut ascending = ordered_request(false, true, true, 2);
    assert!(policy.test(&mut ascending));
    assert!(!ascending.lock_out);
    assert!(!ascending.must_block);

    let mut descending = ordered_request(false, true, true, 1);
    assert!(!policy.test(&mut descending));
    assert!(descending.lock_out);
    assert!(descending.must_block);
    // Leave the policy clean for its drop assertion.
    let mut policy = policy;
    policy.release(&ordered_unlock(false, 1));
}
