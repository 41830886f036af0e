use {
    crate::{
        auth::Authorization,
        cell::ValueCell,
        lock::{MatchedPolicy, Mode, Order, RawLock, SharedExclusive},
        meta::MetaLock,
        proxy::{Grant, ReadProxy, WriteProxy},
    },
    static_assertions::assert_impl_all,
    std::fmt::{Debug, Formatter},
};


/// A value coupled to a lock, accessible only through proxy handles.
///
/// The container owns one value and one lock of kind `L`. Every access path
/// returns a proxy that acquired the lock on the way in and releases it when
/// its last copy is dropped, so the lock can never be forgotten. A denied
/// acquisition (the lock was contended and the call was non-blocking, the
/// authorization refused, or the lock kind cannot grant the request at all)
/// surfaces as `None` and nothing else; the acquisition path neither panics
/// nor allocates an error.
///
/// Three families of accessors:
///
/// - [`get_read`](Self::get_read) / [`get_write`](Self::get_write): plain
///   locking, no deadlock prevention.
/// - [`get_read_auth`](Self::get_read_auth) /
///   [`get_write_auth`](Self::get_write_auth): the [`Authorization`] vets
///   every acquisition against what the thread already holds.
/// - [`get_read_multi`](Self::get_read_multi) /
///   [`get_write_multi`](Self::get_write_multi): additionally route through
///   a [`MetaLock`] so that multi-lock sequences can be admitted globally.
///
/// Each accessor has a `try_` variant that refuses instead of waiting.
///
/// # Example
///
/// ```
/// use {custody::Protected, std::thread};
///
/// let counter: Protected<u64> = Protected::new(0u64);
/// thread::scope(|scope| {
///     for _ in 0..4 {
///         scope.spawn(|| {
///             for _ in 0..1000 {
///                 let proxy = counter.get_write().unwrap();
///                 *proxy.write() += 1;
///             }
///         });
///     }
/// });
/// assert_eq!(counter.into_inner(), 4000);
/// ```
pub struct Protected<T, L = SharedExclusive> {
    lock: L,
    cell: ValueCell<T>,
}

// SAFETY: - The lock kinds guarantee that an exclusive grant excludes every
//           other grant, so mutable access is handed to one thread at a time;
//           that requires T: Send.
//         - Shared grants hand &T to several threads at once; that requires
//           T: Sync.
//         - The borrow ledger in the cell keeps the writer-reads overlap
//           (one thread holding both kinds of proxy) from aliasing.
unsafe impl<T, L> Sync for Protected<T, L>
where
    T: Send + Sync,
    L: Sync,
{
}

assert_impl_all!(Protected<u8>: Send, Sync);

impl<T, L> Protected<T, L>
where
    L: RawLock + Default,
{
    /// Creates a container with a default-constructed lock.
    pub fn new(value: T) -> Self {
        Self::with_lock(value, L::default())
    }
}

impl<T, L> Protected<T, L>
where
    L: RawLock,
{
    /// Creates a container around a configured lock, e.g. an
    /// [`Ordered`](crate::lock::Ordered) one.
    ///
    /// # Example
    ///
    /// ```
    /// use custody::{lock::{Ordered, ExclusiveOnly}, Protected};
    ///
    /// let value = Protected::with_lock(5, Ordered::new(ExclusiveOnly::new(), 3));
    /// assert_eq!(value.order(), 3);
    /// ```
    pub fn with_lock(value: T, lock: L) -> Self {
        Self {
            lock,
            cell: ValueCell::new(value),
        }
    }

    /// Waits for a writable proxy. No deadlock prevention.
    pub fn get_write(&self) -> Option<WriteProxy<'_, T>> {
        self.write_proxy(None, None, true)
    }

    /// A writable proxy if the lock can be granted right now.
    pub fn try_get_write(&self) -> Option<WriteProxy<'_, T>> {
        self.write_proxy(None, None, false)
    }

    /// Waits for a read-only proxy. No deadlock prevention.
    pub fn get_read(&self) -> Option<ReadProxy<'_, T>> {
        self.read_proxy(None, None, true)
    }

    /// A read-only proxy if the lock can be granted right now.
    pub fn try_get_read(&self) -> Option<ReadProxy<'_, T>> {
        self.read_proxy(None, None, false)
    }

    /// Waits for a writable proxy, with deadlock prevention.
    ///
    /// The acquisition is registered with `auth` and released when the last
    /// proxy copy drops; `None` means the authorization (or the lock) turned
    /// the request down, and the right response is to release everything and
    /// retry.
    pub fn get_write_auth(&self, auth: &Authorization) -> Option<WriteProxy<'_, T>> {
        self.write_proxy(None, Some(auth), true)
    }

    /// Non-blocking [`get_write_auth`](Self::get_write_auth).
    pub fn try_get_write_auth(&self, auth: &Authorization) -> Option<WriteProxy<'_, T>> {
        self.write_proxy(None, Some(auth), false)
    }

    /// Waits for a read-only proxy, with deadlock prevention.
    pub fn get_read_auth(&self, auth: &Authorization) -> Option<ReadProxy<'_, T>> {
        self.read_proxy(None, Some(auth), true)
    }

    /// Non-blocking [`get_read_auth`](Self::get_read_auth).
    pub fn try_get_read_auth(&self, auth: &Authorization) -> Option<ReadProxy<'_, T>> {
        self.read_proxy(None, Some(auth), false)
    }

    /// Waits for a writable proxy, with deadlock prevention and meta-lock
    /// admission control.
    ///
    /// The meta-lock is entered shared before the container lock is taken
    /// and left after it is released, so a thread holding the meta-lock
    /// exclusively has undisturbed access to every container routed through
    /// it. All code sharing the containers must use the same meta-lock for
    /// that guarantee to mean anything.
    pub fn get_write_multi<'a>(
        &'a self,
        meta: &'a MetaLock,
        auth: &Authorization,
    ) -> Option<WriteProxy<'a, T>> {
        self.write_proxy(Some(meta), Some(auth), true)
    }

    /// Non-blocking [`get_write_multi`](Self::get_write_multi).
    pub fn try_get_write_multi<'a>(
        &'a self,
        meta: &'a MetaLock,
        auth: &Authorization,
    ) -> Option<WriteProxy<'a, T>> {
        self.write_proxy(Some(meta), Some(auth), false)
    }

    /// Waits for a read-only proxy, with deadlock prevention and meta-lock
    /// admission control.
    pub fn get_read_multi<'a>(
        &'a self,
        meta: &'a MetaLock,
        auth: &Authorization,
    ) -> Option<ReadProxy<'a, T>> {
        self.read_proxy(Some(meta), Some(auth), true)
    }

    /// Non-blocking [`get_read_multi`](Self::get_read_multi).
    pub fn try_get_read_multi<'a>(
        &'a self,
        meta: &'a MetaLock,
        auth: &Authorization,
    ) -> Option<ReadProxy<'a, T>> {
        self.read_proxy(Some(meta), Some(auth), false)
    }

    /// The lock's configured order; 0 unless the lock is
    /// [`Ordered`](crate::lock::Ordered).
    pub fn order(&self) -> Order {
        self.lock.order()
    }

    /// Unwraps the value, consuming the container.
    pub fn into_inner(self) -> T {
        self.cell.into_inner()
    }

    /// Direct access to the value; no locking needed since the borrow is
    /// exclusive by construction.
    pub fn get_mut(&mut self) -> &mut T {
        self.cell.get_mut()
    }

    fn write_proxy<'a>(
        &'a self,
        meta: Option<&'a MetaLock>,
        auth: Option<&Authorization>,
        blocking: bool,
    ) -> Option<WriteProxy<'a, T>> {
        let meta = meta.map(MetaLock::lock);
        Grant::acquire(&self.cell, &self.lock, meta, auth, Mode::Write, blocking)
            .map(WriteProxy::new)
    }

    fn read_proxy<'a>(
        &'a self,
        meta: Option<&'a MetaLock>,
        auth: Option<&Authorization>,
        blocking: bool,
    ) -> Option<ReadProxy<'a, T>> {
        let meta = meta.map(MetaLock::lock);
        Grant::acquire(&self.cell, &self.lock, meta, auth, Mode::Read, blocking)
            .map(ReadProxy::new)
    }
}

impl<T, L> Protected<T, L>
where
    L: MatchedPolicy,
{
    /// A fresh authorization driven by the policy matched to this
    /// container's lock kind.
    ///
    /// One authorization serves its thread for containers of every lock
    /// kind; creating it from the most common kind in use is a good default.
    pub fn new_authorization(&self) -> Authorization {
        Authorization::new(L::Policy::default())
    }
}

impl<T, L> Debug for Protected<T, L>
where
    T: Debug,
    L: RawLock,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Protected");
        match self.try_get_read() {
            Some(proxy) => {
                let value = proxy.read();
                s.field("value", &&*value);
            }
            None => {
                s.field("value", &format_args!("<locked>"));
            }
        }
        s.finish_non_exhaustive()
    }
}
