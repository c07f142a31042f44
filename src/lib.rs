//! turnkv - an in-memory key-value store driven by priority-ordered
//! concurrent command workers.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            turnkv                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Execution Layer (execution/)                │   │
//! │  │   command file → Dispatcher → one Worker per command     │   │
//! │  │          RunObserver hooks  →  RunReport                 │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │            Concurrency Layer (concurrency/)              │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  TurnScheduler: priority rounds, Mutex+Condvar  │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  AccessGuard: RwLock<Store> + GuardStats        │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Store Layer (store/)                     │   │
//! │  │      Store (arena + hash buckets) + Record + hash        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (Priority, Ticket, Error, config)
//! - [`store`] - Record storage
//! - [`concurrency`] - Turn scheduler and reader/writer guard
//! - [`execution`] - Commands, workers, dispatcher, observers
//!
//! # Quick Start
//! ```
//! use turnkv::{Command, Dispatcher, RunOptions};
//!
//! let dispatcher = Dispatcher::new(RunOptions::default());
//! let commands = vec![
//!     Command::insert("alice", 100, 0),
//!     Command::update("alice", 150, 1),
//!     Command::print(2),
//! ];
//!
//! let report = dispatcher.run(&commands, &()).unwrap();
//! assert_eq!(report.final_snapshot.unwrap()[0].value, 150);
//! ```

pub mod common;
pub mod concurrency;
pub mod execution;
pub mod store;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DuplicatePolicy, RunOptions};
pub use common::{Error, Priority, Result, Ticket};

pub use concurrency::{AccessGuard, AccessMode, GuardStatsSnapshot, TurnScheduler};
pub use execution::{Command, CommandKind, CommandOutcome, Dispatcher, RunObserver, RunReport};
pub use store::{Record, Store};
