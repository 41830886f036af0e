use {
    crate::{
        auth::Authorization,
        cell::ValueCell,
        lock::{Count, Mode, SharedExclusive, ORDER_UNORDERED},
        proxy::Grant,
    },
    static_assertions::assert_not_impl_any,
    std::{
        fmt::{Debug, Formatter},
        rc::Rc,
    },
};


/// Global admission control for multi-lock sequences.
///
/// A meta-lock is a [`SharedExclusive`](crate::lock::SharedExclusive) lock
/// with no value behind it. Every container acquisition routed through it
/// (the `_multi` accessors of [`Protected`](crate::Protected)) enters it in
/// shared mode for the duration of the container grant; those shared entries
/// are only *tested* against the thread's policy, never registered, so any
/// number of them can nest.
///
/// A thread that needs several exclusive container locks at once takes the
/// meta-lock exclusively with [`get_write_auth`](Self::get_write_auth). That
/// blocks new meta-routed acquisitions, waits for the existing ones to
/// drain, and then returns a proxy; while it is held, the thread's own
/// `_multi` acquisitions pass the meta-lock without blocking (the
/// writer-reads rule) and every container it asks for is free of meta-routed
/// competitors. Drop the meta proxy as soon as all the container locks are
/// in hand; the container grants keep their shared meta entries alive, so
/// other threads can proceed on containers the sequence did not touch.
///
/// Taking the meta-lock exclusively while holding anything else would be a
/// textbook deadlock, so it is refused whenever the authorization has any
/// holdings at all.
///
/// # Example
///
/// ```
/// use custody::{MetaLock, Protected};
///
/// let meta = MetaLock::new();
/// let a: Protected<i32> = Protected::new(1);
/// let b: Protected<i32> = Protected::new(2);
/// let auth = a.new_authorization();
///
/// let gate = meta.get_write_auth(&auth).unwrap();
/// let wa = a.get_write_multi(&meta, &auth).unwrap();
/// let wb = b.get_write_multi(&meta, &auth).unwrap();
/// gate.clear(); // both containers secured; let everyone else move again
///
/// *wa.write() += *wb.read();
/// # drop((wa, wb));
/// ```
pub struct MetaLock {
    cell: ValueCell<()>,
    lock: SharedExclusive,
}

// SAFETY: The cell guards `()`, which is already Send + Sync, so the only
// thing standing between MetaLock and Sync is the UnsafeCell; the same
// lock-guarantees argument used for Protected<T, L> applies here.
unsafe impl Sync for MetaLock {}

impl MetaLock {
    pub const fn new() -> Self {
        Self {
            cell: ValueCell::new(()),
            lock: SharedExclusive::new(),
        }
    }

    /// Waits for exclusive admission: no meta-routed container acquisition
    /// can begin, and all existing ones have drained.
    ///
    /// Denied (`None`) when `auth` already holds anything, or when the
    /// policy refuses an exclusive lock outright.
    pub fn get_write_auth(&self, auth: &Authorization) -> Option<MetaWriteProxy<'_>> {
        self.write_auth(auth, true)
    }

    /// Non-blocking [`get_write_auth`](Self::get_write_auth).
    pub fn try_get_write_auth(&self, auth: &Authorization) -> Option<MetaWriteProxy<'_>> {
        self.write_auth(auth, false)
    }

    /// Waits for a shared entry on the meta-lock, registered with `auth`
    /// like any other shared lock.
    ///
    /// Container acquisitions take their shared entries themselves; this is
    /// for code that wants to fence against multi-lock sequences without
    /// touching a container.
    pub fn get_read_auth(&self, auth: &Authorization) -> Option<MetaReadProxy<'_>> {
        self.read_auth(auth, true)
    }

    /// Non-blocking [`get_read_auth`](Self::get_read_auth).
    pub fn try_get_read_auth(&self, auth: &Authorization) -> Option<MetaReadProxy<'_>> {
        self.read_auth(auth, false)
    }

    fn write_auth(&self, auth: &Authorization, blocking: bool) -> Option<MetaWriteProxy<'_>> {
        // Holding anything else here is the classic deadlock, whatever the
        // current meta-lock state; the policy is asked with fully
        // pessimistic flags first so such callers are turned away outright.
        // No snapshot problem: only the owning thread mutates its
        // authorization.
        if !auth.guess_write_allowed(true, true, ORDER_UNORDERED) {
            return None;
        }
        let grant = Grant::acquire(
            &self.cell,
            &self.lock,
            None,
            Some(auth),
            Mode::Write,
            blocking,
        )?;
        Some(MetaWriteProxy { grant })
    }

    fn read_auth(&self, auth: &Authorization, blocking: bool) -> Option<MetaReadProxy<'_>> {
        let grant = Grant::acquire(
            &self.cell,
            &self.lock,
            None,
            Some(auth),
            Mode::Read,
            blocking,
        )?;
        Some(MetaReadProxy { grant })
    }

    pub(crate) fn lock(&self) -> &SharedExclusive {
        &self.lock
    }
}

impl Default for MetaLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MetaLock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaLock").finish_non_exhaustive()
    }
}

/// Exclusive admission to a [`MetaLock`]; the multi-lock gate.
///
/// Copies share one grant; the admission ends when the last copy drops or
/// [`clear`](Self::clear) consumes it.
pub struct MetaWriteProxy<'a> {
    grant: Rc<Grant<'a, ()>>,
}

/// A shared entry on a [`MetaLock`].
pub struct MetaReadProxy<'a> {
    grant: Rc<Grant<'a, ()>>,
}

assert_not_impl_any!(MetaWriteProxy<'_>: Send, Sync);
assert_not_impl_any!(MetaReadProxy<'_>: Send, Sync);

impl MetaWriteProxy<'_> {
    /// Drops this copy; the meta-lock is released when the last copy is
    /// gone. Do this as soon as every container lock of the sequence is
    /// held.
    pub fn clear(self) {}

    /// Shared count observed at acquisition; always 0 for the exclusive
    /// grant.
    pub fn last_lock_count(&self) -> Count {
        self.grant.lock_count()
    }
}

impl MetaReadProxy<'_> {
    /// Drops this copy; the entry is released when the last copy is gone.
    pub fn clear(self) {}

    /// Shared count observed at acquisition.
    pub fn last_lock_count(&self) -> Count {
        self.grant.lock_count()
    }
}

impl Clone for MetaWriteProxy<'_> {
    fn clone(&self) -> Self {
        Self {
            grant: self.grant.clone(),
        }
    }
}

impl Clone for MetaReadProxy<'_> {
    fn clone(&self) -> Self {
        Self {
            grant: self.grant.clone(),
        }
    }
}

impl Debug for MetaWriteProxy<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaWriteProxy").finish_non_exhaustive()
    }
}

impl Debug for MetaReadProxy<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaReadProxy").finish_non_exhaustive()
    }
}
