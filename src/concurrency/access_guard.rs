//! Reader/writer exclusion around the [`Store`].
//!
//! - [`StoreReadGuard`] - Shared access (search, print)
//! - [`StoreWriteGuard`] - Exclusive access (insert, update, delete)
//!
//! Both guards update [`GuardStats`] on creation and drop.

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::concurrency::GuardStats;
use crate::store::Store;

/// Mode in which the store is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Many holders at once.
    Shared,
    /// A single holder.
    Exclusive,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Shared => write!(f, "READ"),
            AccessMode::Exclusive => write!(f, "WRITE"),
        }
    }
}

/// Owns the store and hands out counted read/write guards.
///
/// `parking_lot`'s lock cannot fail at acquisition and does not poison,
/// so a worker that panics while holding a guard leaves the store usable.
pub struct AccessGuard {
    store: RwLock<Store>,
    stats: GuardStats,
}

impl AccessGuard {
    /// Wrap a store.
    pub fn new(store: Store) -> Self {
        Self {
            store: RwLock::new(store),
            stats: GuardStats::new(),
        }
    }

    /// Acquire shared access, blocking while a writer holds the store.
    pub fn read(&self) -> StoreReadGuard<'_> {
        let lock = self.store.read();
        self.stats.record_acquire(AccessMode::Shared);
        StoreReadGuard { owner: self, lock }
    }

    /// Acquire exclusive access, blocking while anyone else holds the store.
    pub fn write(&self) -> StoreWriteGuard<'_> {
        let lock = self.store.write();
        self.stats.record_acquire(AccessMode::Exclusive);
        StoreWriteGuard { owner: self, lock }
    }

    /// Lock traffic so far.
    pub fn stats(&self) -> &GuardStats {
        &self.stats
    }

    /// Unwrap the store.
    pub fn into_inner(self) -> Store {
        self.store.into_inner()
    }
}

impl Default for AccessGuard {
    fn default() -> Self {
        Self::new(Store::new())
    }
}

/// Shared access to the store.
pub struct StoreReadGuard<'a> {
    owner: &'a AccessGuard,
    lock: RwLockReadGuard<'a, Store>,
}

impl Deref for StoreReadGuard<'_> {
    type Target = Store;

    #[inline]
    fn deref(&self) -> &Store {
        &self.lock
    }
}

impl Drop for StoreReadGuard<'_> {
    fn drop(&mut self) {
        self.owner.stats.record_release(AccessMode::Shared);
    }
}

/// Exclusive access to the store.
pub struct StoreWriteGuard<'a> {
    owner: &'a AccessGuard,
    lock: RwLockWriteGuard<'a, Store>,
}

impl Deref for StoreWriteGuard<'_> {
    type Target = Store;

    #[inline]
    fn deref(&self) -> &Store {
        &self.lock
    }
}

impl DerefMut for StoreWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Store {
        &mut self.lock
    }
}

impl Drop for StoreWriteGuard<'_> {
    fn drop(&mut self) {
        self.owner.stats.record_release(AccessMode::Exclusive);
    }
}
