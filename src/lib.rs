//! This crate provides the [`Protected`] container, which couples a value
//! with a lock and only hands the value out through proxy handles, plus a
//! deadlock-prevention layer that vets every acquisition against what the
//! thread already holds.
//!
//! # Motivation
//!
//! Conventional mutex code keeps the mutex and the data it protects apart,
//! and nothing stops a thread that already holds one lock from blocking on a
//! second one, which is the classic recipe for a deadlock. This crate
//! addresses both problems:
//!
//! 1. The value inside a [`Protected`] container is unreachable except
//!    through a proxy, and the proxy holds the container's lock for exactly
//!    as long as it lives. Locking cannot be forgotten, and unlocking cannot
//!    happen early.
//! 2. An [`Authorization`] carried by the thread records how many locks the
//!    thread holds and *refuses* any acquisition that could close a waits-for
//!    cycle, before any waiting happens. Deadlocks are prevented, not
//!    detected: the cost is that some safe acquisitions are refused too, and
//!    the caller is expected to release what it holds, back off, and retry.
//!
//! Two escape hatches cover workloads that genuinely need several exclusive
//! locks at once: a global [`MetaLock`] that stops the world long enough to
//! hand one thread all the locks it asked for, and
//! [`Ordered`](lock::Ordered) locks acquired in strictly ascending order.
//!
//! # Example
//!
//! ```
//! use {custody::Protected, std::thread};
//!
//! let inventory: Protected<Vec<u32>> = Protected::new(vec![3u32, 5]);
//!
//! thread::scope(|scope| {
//!     scope.spawn(|| {
//!         // Readers share the lock...
//!         if let Some(proxy) = inventory.get_read() {
//!             let _n = proxy.read().len();
//!         }
//!     });
//!     scope.spawn(|| {
//!         // ...writers get it alone, once the readers have drained.
//!         let proxy = inventory.get_write().unwrap();
//!         proxy.write().push(7);
//!     });
//! });
//! ```
//!
//! # Deadlock prevention
//!
//! ```
//! use custody::Protected;
//!
//! let left: Protected<i32> = Protected::new(1);
//! let right: Protected<i32> = Protected::new(2);
//! let auth = left.new_authorization();
//!
//! let holding = left.get_write_auth(&auth).unwrap();
//! // `right` is free, so a second lock is safe and admitted:
//! let also = right.get_read_auth(&auth).unwrap();
//! drop(also);
//! # drop(holding);
//! ```
//!
//! Had `right` been contended, the second acquisition would have returned
//! `None` instead of waiting, because waiting there is exactly how deadlocks
//! form. The thread then releases `holding`, takes a nap, and tries again.
//!
//! # Choosing a lock kind
//!
//! The second type parameter of [`Protected`] selects the lock state
//! machine; see the [`lock`] module. The default
//! [`SharedExclusive`](lock::SharedExclusive) is right unless profiling says
//! otherwise.

pub mod auth;
pub mod lock;

mod cell;
mod container;
mod copy;
mod meta;
mod proxy;
mod thread_token;

pub use {
    auth::Authorization,
    cell::{ValueRead, ValueWrite},
    container::Protected,
    copy::{copy_value, copy_value_auth, copy_value_multi},
    lock::{Count, Mode, Order, RawLock, ORDER_UNORDERED},
    meta::{MetaLock, MetaReadProxy, MetaWriteProxy},
    proxy::{ReadProxy, WriteProxy},
};
