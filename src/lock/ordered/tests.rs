use {
    super::Ordered,
    crate::{
        auth::{Authorization, MultiReadOneWrite, OrderedPolicy},
        lock::{ExclusiveOnly, Mode, RawLock, SharedExclusive, SharedOnly, Untracked},
    },
};

fn ordered_auth() -> Authorization {
    Authorization::new(OrderedPolicy::<MultiReadOneWrite>::default())
}

#[test]
fn reports_its_order() {
    assert_eq!(Ordered::new(SharedExclusive::new(), 7).order(), 7);
    assert_eq!(Ordered::new(ExclusiveOnly::new(), 1).order(), 1);
    assert_eq!(Ordered::new(SharedOnly::new(), 2).order(), 2);
    assert_eq!(Ordered::new(Untracked::new(), 3).order(), 3);
    assert_eq!(SharedExclusive::new().order(), 0);
}

#[test]
fn refuses_untracked_callers() {
    let lock = Ordered::new(SharedExclusive::new(), 1);
    assert_eq!(lock.acquire(None, Mode::Read, true, false), None);
    assert_eq!(lock.release(None, Mode::Read, false), None);
}

#[test]
fn refuses_unordered_policies() {
    let lock = Ordered::new(SharedExclusive::new(), 1);
    let auth = Authorization::new(MultiReadOneWrite::default());
    assert_eq!(lock.acquire(Some(&auth), Mode::Read, true, false), None);
    assert_eq!(auth.reading_count(), 0);
}

#[test]
fn ascending_acquisitions_hold_together() {
    let first = Ordered::new(SharedExclusive::new(), 1);
    let second = Ordered::new(SharedExclusive::new(), 2);
    let auth = ordered_auth();
    assert_eq!(first.acquire(Some(&auth), Mode::Write, true, false), Some(0));
    assert_eq!(second.acquire(Some(&auth), Mode::Write, true, false), Some(0));
    assert_eq!(auth.writing_count(), 2);
    assert_eq!(second.release(Some(&auth), Mode::Write, false), Some(0));
    assert_eq!(first.release(Some(&auth), Mode::Write, false), Some(0));
}

#[test]
fn descending_contended_acquisition_is_refused() {
    let low = Ordered::new(SharedExclusive::new(), 1);
    let high = Ordered::new(SharedExclusive::new(), 2);
    let auth = ordered_auth();
    assert_eq!(low.acquire(Some(&auth), Mode::Write, true, false), Some(0));
    std::thread::scope(|scope| {
        scope.spawn(|| {
            let other = ordered_auth();
            assert_eq!(high.acquire(Some(&other), Mode::Write, true, false), Some(0));
            // Descending and busy: back to the inner rules, which refuse.
            assert_eq!(low.acquire(Some(&other), Mode::Write, true, false), None);
            assert_eq!(high.release(Some(&other), Mode::Write, false), Some(0));
        });
    });
    assert_eq!(low.release(Some(&auth), Mode::Write, false), Some(0));
}

#[test]
fn descending_idle_acquisition_is_granted() {
    let low = Ordered::new(SharedExclusive::new(), 1);
    let high = Ordered::new(SharedExclusive::new(), 2);
    let auth = ordered_auth();
    assert_eq!(high.acquire(Some(&auth), Mode::Write, true, false), Some(0));
    // Out of order, but the lower lock is idle, so no cycle can form.
    assert_eq!(low.acquire(Some(&auth), Mode::Write, true, false), Some(0));
    assert_eq!(low.release(Some(&auth), Mode::Write, false), Some(0));
    assert_eq!(high.release(Some(&auth), Mode::Write, false), Some(0));
}

#[test]
fn order_zero_behaves_as_the_inner_lock() {
    let lock = Ordered::new(SharedExclusive::new(), 0);
    assert_eq!(lock.order(), 0);
    let auth = ordered_auth();
    assert_eq!(lock.acquire(Some(&auth), Mode::Read, true, false), Some(1));
    assert_eq!(auth.reading_count(), 1);
    assert_eq!(lock.release(Some(&auth), Mode::Read, false), Some(0));
}
