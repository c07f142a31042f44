//! Concurrency control for command workers.
//!
//! # Components
//! - [`TurnScheduler`] - Priority gate deciding which round may run
//! - [`AccessGuard`] - Reader/writer exclusion around the store
//! - [`GuardStats`] - Lock acquisition/release counters
//!
//! The two are deliberately independent: the scheduler has its own mutex
//! and condition variable, and workers only touch the access guard after
//! being admitted.

mod access_guard;
mod scheduler;
mod stats;

pub use access_guard::{AccessGuard, AccessMode, StoreReadGuard, StoreWriteGuard};
pub use scheduler::{PendingTicket, SchedulerSnapshot, Turn, TurnScheduler, TurnState};
pub use stats::{GuardStats, GuardStatsSnapshot};
