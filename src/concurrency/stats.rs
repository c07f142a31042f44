//! Access guard statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::concurrency::AccessMode;

/// Lock traffic counted by the [`AccessGuard`](crate::concurrency::AccessGuard).
///
/// All fields are atomic; guards bump them on creation and drop without
/// any extra locking.
///
/// # Memory Ordering
/// `Ordering::Relaxed` throughout. The counters are only read after all
/// workers have joined, and the join itself synchronizes.
///
/// # Example
/// ```
/// use turnkv::concurrency::{AccessMode, GuardStats};
///
/// let stats = GuardStats::new();
/// stats.record_acquire(AccessMode::Shared);
/// assert_eq!(stats.snapshot().acquisitions(), 1);
/// ```
#[derive(Debug)]
pub struct GuardStats {
    /// Shared (reader) acquisitions.
    pub read_acquisitions: AtomicU64,

    /// Shared (reader) releases.
    pub read_releases: AtomicU64,

    /// Exclusive (writer) acquisitions.
    pub write_acquisitions: AtomicU64,

    /// Exclusive (writer) releases.
    pub write_releases: AtomicU64,
}

impl GuardStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            read_acquisitions: AtomicU64::new(0),
            read_releases: AtomicU64::new(0),
            write_acquisitions: AtomicU64::new(0),
            write_releases: AtomicU64::new(0),
        }
    }

    /// Count one acquisition in `mode`.
    #[inline]
    pub fn record_acquire(&self, mode: AccessMode) {
        match mode {
            AccessMode::Shared => self.read_acquisitions.fetch_add(1, Ordering::Relaxed),
            AccessMode::Exclusive => self.write_acquisitions.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Count one release in `mode`.
    #[inline]
    pub fn record_release(&self, mode: AccessMode) {
        match mode {
            AccessMode::Shared => self.read_releases.fetch_add(1, Ordering::Relaxed),
            AccessMode::Exclusive => self.write_releases.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> GuardStatsSnapshot {
        GuardStatsSnapshot {
            read_acquisitions: self.read_acquisitions.load(Ordering::Relaxed),
            read_releases: self.read_releases.load(Ordering::Relaxed),
            write_acquisitions: self.write_acquisitions.load(Ordering::Relaxed),
            write_releases: self.write_releases.load(Ordering::Relaxed),
        }
    }
}

impl Default for GuardStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`GuardStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardStatsSnapshot {
    pub read_acquisitions: u64,
    pub read_releases: u64,
    pub write_acquisitions: u64,
    pub write_releases: u64,
}

impl GuardStatsSnapshot {
    /// Total acquisitions in either mode.
    pub fn acquisitions(&self) -> u64 {
        self.read_acquisitions + self.write_acquisitions
    }

    /// Total releases in either mode.
    pub fn releases(&self) -> u64 {
        self.read_releases + self.write_releases
    }

    /// Whether every acquisition has been matched by a release.
    pub fn is_balanced(&self) -> bool {
        self.read_acquisitions == self.read_releases
            && self.write_acquisitions == self.write_releases
    }
}

impl fmt::Display for GuardStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ acquisitions: {} (read {}, write {}), releases: {} }}",
            self.acquisitions(),
            self.read_acquisitions,
            self.write_acquisitions,
            self.releases()
        )
    }
}
