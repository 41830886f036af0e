use {
    super::Broken,
    crate::{
        lock::{Mode, RawLock},
        Protected,
    },
};

#[test]
fn never_grants() {
    let lock = Broken::new();
    assert_eq!(lock.acquire(None, Mode::Read, true, false), None);
    assert_eq!(lock.acquire(None, Mode::Write, true, false), None);
    assert_eq!(lock.release(None, Mode::Read, false), None);
}

#[test]
fn counters_stay_clean() {
    let container: Protected<u8, Broken> = Protected::new(1);
    let auth = container.new_authorization();
    assert!(container.get_write_auth(&auth).is_none());
    assert!(container.get_read_auth(&auth).is_none());
    assert_eq!(auth.reading_count(), 0);
    assert_eq!(auth.writing_count(), 0);
}
