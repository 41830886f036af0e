use {
    super::ExclusiveOnly,
    crate::{
        auth::{Authorization, ExclusiveTracking, MultiReadOneWrite},
        lock::{Mode, RawLock},
    },
    std::{
        thread,
        time::{Duration, Instant},
    },
};

fn wait_until(what: &str, predicate: impl Fn() -> bool) {
    let start = Instant::now();
    while !predicate() {
        assert!(start.elapsed() < Duration::from_secs(5), "timed out: {what}");
        thread::yield_now();
    }
}

#[test]
fn one_holder_at_a_time() {
    let lock = ExclusiveOnly::new();
    assert_eq!(lock.acquire(None, Mode::Write, true, false), Some(0));
    assert_eq!(lock.acquire(None, Mode::Write, false, false), None);
    // Shared requests are exclusive requests here.
    assert_eq!(lock.acquire(None, Mode::Read, false, false), None);
    assert_eq!(lock.release(None, Mode::Write, false), Some(0));
    assert_eq!(lock.acquire(None, Mode::Read, true, false), Some(0));
    assert_eq!(lock.release(None, Mode::Read, false), Some(0));
}

#[test]
fn reads_register_as_writes() {
    let lock = ExclusiveOnly::new();
    let auth = Authorization::new(ExclusiveTracking::default());
    assert_eq!(lock.acquire(Some(&auth), Mode::Read, true, false), Some(0));
    assert_eq!(auth.writing_count(), 1);
    assert_eq!(auth.reading_count(), 0);
    assert_eq!(lock.release(Some(&auth), Mode::Read, false), Some(0));
    assert_eq!(auth.writing_count(), 0);
}

#[test]
fn contention_blocks_until_release() {
    let lock = ExclusiveOnly::new();
    assert_eq!(lock.acquire(None, Mode::Write, true, false), Some(0));
    thread::scope(|scope| {
        scope.spawn(|| {
            assert_eq!(lock.acquire(None, Mode::Write, true, false), Some(0));
            assert_eq!(lock.release(None, Mode::Write, false), Some(0));
        });
        wait_until("writer queued", || lock.state.lock().writers_waiting > 0);
        assert_eq!(lock.release(None, Mode::Write, false), Some(0));
    });
    assert_eq!(lock.acquire(None, Mode::Write, false, false), Some(0));
    assert_eq!(lock.release(None, Mode::Write, false), Some(0));
}

#[test]
fn queued_writer_reports_a_lock_out() {
    let lock = ExclusiveOnly::new();
    assert_eq!(lock.acquire(None, Mode::Write, true, false), Some(0));
    thread::scope(|scope| {
        scope.spawn(|| {
            assert_eq!(lock.acquire(None, Mode::Write, true, false), Some(0));
            assert_eq!(lock.release(None, Mode::Write, false), Some(0));
        });
        wait_until("writer queued", || lock.state.lock().writers_waiting > 0);
        scope.spawn(|| {
            // A multi-read-one-write authorization that holds anything is
            // refused while another writer waits here.
            let auth = Authorization::new(MultiReadOneWrite::default());
            let side = crate::lock::SharedExclusive::new();
            assert_eq!(side.acquire(Some(&auth), Mode::Read, true, false), Some(1));
            assert_eq!(lock.acquire(Some(&auth), Mode::Write, true, false), None);
            assert_eq!(side.release(Some(&auth), Mode::Read, false), Some(0));
        });
        thread::sleep(Duration::from_millis(5));
        assert_eq!(lock.release(None, Mode::Write, false), Some(0));
    });
}

#[test]
fn rollback_on_nonblocking_denial() {
    let lock = ExclusiveOnly::new();
    assert_eq!(lock.acquire(None, Mode::Write, true, false), Some(0));
    thread::scope(|scope| {
        scope.spawn(|| {
            let auth = Authorization::new(ExclusiveTracking::default());
            assert_eq!(lock.acquire(Some(&auth), Mode::Write, false, false), None);
            assert_eq!(auth.writing_count(), 0);
        });
    });
    assert_eq!(lock.release(None, Mode::Write, false), Some(0));
}
