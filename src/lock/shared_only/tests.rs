use {
    super::SharedOnly,
    crate::{
        auth::{Authorization, DenyAll, ReadOnly},
        lock::{Mode, RawLock},
    },
    std::thread,
};

#[test]
fn reads_count_up_and_down() {
    let lock = SharedOnly::new();
    assert_eq!(lock.acquire(None, Mode::Read, true, false), Some(1));
    assert_eq!(lock.acquire(None, Mode::Read, false, false), Some(2));
    assert_eq!(lock.release(None, Mode::Read, false), Some(1));
    assert_eq!(lock.release(None, Mode::Read, false), Some(0));
}

#[test]
fn writes_are_denied() {
    let lock = SharedOnly::new();
    assert_eq!(lock.acquire(None, Mode::Write, true, false), None);
    assert_eq!(lock.release(None, Mode::Write, false), None);
}

#[test]
fn never_counts_as_in_use() {
    let lock = SharedOnly::new();
    let auth = Authorization::new(ReadOnly::default());
    // Piling up reads is always authorized; this lock can never be part of
    // a cycle.
    let first = lock.acquire(Some(&auth), Mode::Read, true, false);
    let second = lock.acquire(Some(&auth), Mode::Read, true, false);
    assert_eq!(first, Some(1));
    assert_eq!(second, Some(2));
    assert_eq!(auth.reading_count(), 2);
    assert_eq!(lock.release(Some(&auth), Mode::Read, false), Some(1));
    assert_eq!(lock.release(Some(&auth), Mode::Read, false), Some(0));
}

#[test]
fn the_policy_is_still_consulted() {
    let lock = SharedOnly::new();
    let deny = Authorization::new(DenyAll);
    assert_eq!(lock.acquire(Some(&deny), Mode::Read, true, false), None);
}

#[test]
fn concurrent_readers() {
    let lock = SharedOnly::new();
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..1000 {
                    assert!(lock.acquire(None, Mode::Read, true, false).is_some());
                    assert!(lock.release(None, Mode::Read, false).is_some());
                }
            });
        }
    });
    assert_eq!(lock.readers.load(std::sync::atomic::Ordering::Relaxed), 0);
}
