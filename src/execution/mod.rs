//! Command execution.
//!
//! # Components
//! - [`Command`] / [`CommandKind`] - Parsed commands
//! - [`command_file`] - Command file loader
//! - [`Dispatcher`] - One worker thread per command
//! - [`CommandOutcome`] / [`RunReport`] - Results
//! - [`observer`] - Logging and reporting hooks

pub mod command;
pub mod command_file;
mod dispatcher;
pub mod observer;
mod outcome;
mod worker;

pub use command::{Command, CommandKind};
pub use command_file::{load_commands, parse_commands};
pub use dispatcher::{Dispatcher, RunReport, WorkerReport};
pub use observer::{EventRecorder, LogFileObserver, Observers, RunObserver, TracingObserver};
pub use outcome::CommandOutcome;
pub use worker::run_command;
