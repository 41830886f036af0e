use crate::{auth::Authorization, lock::RawLock, meta::MetaLock, Protected};


/// Copies `src`'s value into `dst` under plain locking.
///
/// `dst` is locked for writing and `src` for reading; if either acquisition
/// is denied, everything already acquired is rolled back and `false` is
/// returned. With `blocking == false` the copy only happens if both locks
/// are free right now.
///
/// # Example
///
/// ```
/// use custody::{copy_value, Protected};
///
/// let from: Protected<i32> = Protected::new(7);
/// let to: Protected<i32> = Protected::new(0);
/// assert!(copy_value(&to, &from, true));
/// assert_eq!(to.into_inner(), 7);
/// ```
pub fn copy_value<T, LD, LS>(dst: &Protected<T, LD>, src: &Protected<T, LS>, blocking: bool) -> bool
where
    T: Clone,
    LD: RawLock,
    LS: RawLock,
{
    let write = if blocking {
        dst.get_write()
    } else {
        dst.try_get_write()
    };
    let Some(write) = write else {
        return false;
    };
    let read = if blocking {
        src.get_read()
    } else {
        src.try_get_read()
    };
    let Some(read) = read else {
        return false;
    };
    *write.write() = read.read().clone();
    true
}

/// Copies `src`'s value into `dst` with deadlock prevention.
///
/// When both containers carry a nonzero order the locks are acquired in
/// ascending order, so the ordered relaxation applies; when either is
/// unordered the order of acquisition is arbitrary. Both acquisitions are
/// registered with `auth`, and a denial of either rolls everything back.
pub fn copy_value_auth<T, LD, LS>(
    dst: &Protected<T, LD>,
    src: &Protected<T, LS>,
    auth: &Authorization,
    blocking: bool,
) -> bool
where
    T: Clone,
    LD: RawLock,
    LS: RawLock,
{
    let write;
    let read;
    if dst.order() < src.order() {
        write = if blocking {
            dst.get_write_auth(auth)
        } else {
            dst.try_get_write_auth(auth)
        };
        read = if blocking {
            src.get_read_auth(auth)
        } else {
            src.try_get_read_auth(auth)
        };
    } else {
        read = if blocking {
            src.get_read_auth(auth)
        } else {
            src.try_get_read_auth(auth)
        };
        write = if blocking {
            dst.get_write_auth(auth)
        } else {
            dst.try_get_write_auth(auth)
        };
    }
    let (Some(write), Some(read)) = (write, read) else {
        return false;
    };
    *write.write() = read.read().clone();
    true
}

/// Copies `src`'s value into `dst` under meta-lock admission control.
///
/// With `take_meta == true` the meta-lock is taken exclusively first (which
/// fails if `auth` holds anything) and cleared again as soon as both
/// container locks are held. With `take_meta == false` the caller is
/// expected to hold the meta-lock exclusively already; the container
/// acquisitions will then simply pass through it.
pub fn copy_value_multi<T, LD, LS>(
    dst: &Protected<T, LD>,
    src: &Protected<T, LS>,
    meta: &MetaLock,
    auth: &Authorization,
    blocking: bool,
    take_meta: bool,
) -> bool
where
    T: Clone,
    LD: RawLock,
    LS: RawLock,
{
    let gate = if take_meta {
        let gate = if blocking {
            meta.get_write_auth(auth)
        } else {
            meta.try_get_write_auth(auth)
        };
        match gate {
            Some(gate) => Some(gate),
            None => return false,
        }
    } else {
        None
    };

    // Not strictly necessary under the meta-lock, but keep the ordered
    // discipline anyway.
    let write;
    let read;
    if dst.order() < src.order() {
        write = if blocking {
            dst.get_write_multi(meta, auth)
        } else {
            dst.try_get_write_multi(meta, auth)
        };
        read = if blocking {
            src.get_read_multi(meta, auth)
        } else {
            src.try_get_read_multi(meta, auth)
        };
    } else {
        read = if blocking {
            src.get_read_multi(meta, auth)
        } else {
            src.try_get_read_multi(meta, auth)
        };
        write = if blocking {
            dst.get_write_multi(meta, auth)
        } else {
            dst.try_get_write_multi(meta, auth)
        };
    }

    // Both containers are settled one way or the other; let other threads
    // move again before touching the values.
    drop(gate);

    let (Some(write), Some(read)) = (write, read) else {
        return false;
    };
    *write.write() = read.read().clone();
    true
}
