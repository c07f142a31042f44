//! Run observers - best-effort side channels for logging and reporting.
//!
//! Workers call the [`RunObserver`] hooks at fixed points of a command's
//! life. Hooks cannot fail the run: implementations swallow their own
//! errors.
//!
//! - [`TracingObserver`] - `tracing` events
//! - [`LogFileObserver`] - thread log + outcome file
//! - [`EventRecorder`] - in-memory event list, mostly for tests
//! - [`Observers`] - fan-out to several observers

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::common::{Priority, Result};
use crate::concurrency::AccessMode;
use crate::execution::{Command, CommandOutcome, RunReport};

/// Hooks invoked by workers and the dispatcher. All default to no-ops.
pub trait RunObserver: Send + Sync {
    /// The worker reached the turn gate.
    fn turn_waiting(&self, _command: &Command) {}

    /// The worker was admitted.
    fn turn_admitted(&self, _command: &Command) {}

    /// The store guard is now held in `mode`.
    fn guard_acquired(&self, _command: &Command, _mode: AccessMode) {}

    /// The store guard was released. Always precedes the worker's turn finish.
    fn guard_released(&self, _command: &Command, _mode: AccessMode) {}

    /// The command's result, reported before its turn finishes.
    fn command_completed(&self, _command: &Command, _outcome: &CommandOutcome) {}

    /// The worker's turn finished.
    fn turn_finished(&self, _command: &Command) {}

    /// Every worker has joined.
    fn run_completed(&self, _report: &RunReport) {}
}

/// Observes nothing.
impl RunObserver for () {}

// ============================================================================
// TracingObserver
// ============================================================================

/// Emits one `tracing` event per hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn turn_waiting(&self, command: &Command) {
        tracing::debug!(priority = %command.priority, command = %command, "waiting for turn");
    }

    fn turn_admitted(&self, command: &Command) {
        tracing::debug!(priority = %command.priority, "admitted");
    }

    fn guard_acquired(&self, command: &Command, mode: AccessMode) {
        tracing::trace!(priority = %command.priority, %mode, "lock acquired");
    }

    fn guard_released(&self, command: &Command, mode: AccessMode) {
        tracing::trace!(priority = %command.priority, %mode, "lock released");
    }

    fn command_completed(&self, command: &Command, outcome: &CommandOutcome) {
        if outcome.is_failure() {
            tracing::warn!(priority = %command.priority, %outcome, "command failed");
        } else {
            tracing::info!(
                priority = %command.priority,
                kind = %command.kind,
                mutated = outcome.is_mutation(),
                %outcome
            );
        }
    }

    fn run_completed(&self, report: &RunReport) {
        tracing::info!(
            commands = report.outcomes.len(),
            stats = %report.guard_stats,
            "run completed"
        );
    }
}

// ============================================================================
// LogFileObserver
// ============================================================================

struct LogFiles {
    log: BufWriter<File>,
    output: BufWriter<File>,
}

/// Writes the thread log and the outcome file.
///
/// Thread log lines look like `1718000000123456: THREAD 3 WRITE LOCK ACQUIRED`
/// (microsecond timestamp, command priority, message). Every line is
/// flushed immediately so the log survives a crash mid-run.
pub struct LogFileObserver {
    files: Mutex<LogFiles>,
}

impl LogFileObserver {
    /// Create (truncate) both files.
    ///
    /// # Errors
    /// - `Error::Io` if either file cannot be created
    pub fn create(log_path: impl AsRef<Path>, output_path: impl AsRef<Path>) -> Result<Self> {
        let log = BufWriter::new(File::create(log_path)?);
        let output = BufWriter::new(File::create(output_path)?);
        Ok(Self {
            files: Mutex::new(LogFiles { log, output }),
        })
    }

    fn thread_line(&self, priority: Priority, message: fmt::Arguments<'_>) {
        let mut files = self.files.lock();
        let result = writeln!(files.log, "{}: THREAD {} {}", timestamp_micros(), priority, message)
            .and_then(|()| files.log.flush());
        if let Err(err) = result {
            tracing::warn!(error = %err, "thread log write failed");
        }
    }

    fn log_line(&self, message: fmt::Arguments<'_>) {
        let mut files = self.files.lock();
        let result = writeln!(files.log, "{}", message).and_then(|()| files.log.flush());
        if let Err(err) = result {
            tracing::warn!(error = %err, "thread log write failed");
        }
    }

    fn output_line(&self, message: fmt::Arguments<'_>) {
        let mut files = self.files.lock();
        let result = writeln!(files.output, "{}", message).and_then(|()| files.output.flush());
        if let Err(err) = result {
            tracing::warn!(error = %err, "output write failed");
        }
    }
}

impl RunObserver for LogFileObserver {
    fn turn_waiting(&self, command: &Command) {
        self.thread_line(command.priority, format_args!("{}", command));
        self.thread_line(command.priority, format_args!("WAITING FOR MY TURN"));
    }

    fn turn_admitted(&self, command: &Command) {
        self.thread_line(command.priority, format_args!("AWAKENED FOR WORK"));
    }

    fn guard_acquired(&self, command: &Command, mode: AccessMode) {
        self.thread_line(command.priority, format_args!("{} LOCK ACQUIRED", mode));
    }

    fn guard_released(&self, command: &Command, mode: AccessMode) {
        self.thread_line(command.priority, format_args!("{} LOCK RELEASED", mode));
    }

    fn command_completed(&self, _command: &Command, outcome: &CommandOutcome) {
        self.output_line(format_args!("{}", outcome));
    }

    fn run_completed(&self, report: &RunReport) {
        self.log_line(format_args!(
            "Number of lock acquisitions: {}",
            report.guard_stats.acquisitions()
        ));
        self.log_line(format_args!(
            "Number of lock releases: {}",
            report.guard_stats.releases()
        ));
        self.log_line(format_args!("Final Table:"));
        for record in report.final_snapshot.iter().flatten() {
            self.log_line(format_args!("{}", record));
        }
    }
}

fn timestamp_micros() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros())
        .unwrap_or(0)
}

// ============================================================================
// EventRecorder
// ============================================================================

/// A hook call captured by [`EventRecorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    TurnWaiting(Priority),
    TurnAdmitted(Priority),
    GuardAcquired(Priority, AccessMode),
    GuardReleased(Priority, AccessMode),
    Completed(Priority, CommandOutcome),
    TurnFinished(Priority),
    RunCompleted,
}

/// Records every hook call in call order.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<Event>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Take ownership of the recorded events.
    pub fn into_events(self) -> Vec<Event> {
        self.events.into_inner()
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl RunObserver for EventRecorder {
    fn turn_waiting(&self, command: &Command) {
        self.push(Event::TurnWaiting(command.priority));
    }

    fn turn_admitted(&self, command: &Command) {
        self.push(Event::TurnAdmitted(command.priority));
    }

    fn guard_acquired(&self, command: &Command, mode: AccessMode) {
        self.push(Event::GuardAcquired(command.priority, mode));
    }

    fn guard_released(&self, command: &Command, mode: AccessMode) {
        self.push(Event::GuardReleased(command.priority, mode));
    }

    fn command_completed(&self, command: &Command, outcome: &CommandOutcome) {
        self.push(Event::Completed(command.priority, outcome.clone()));
    }

    fn turn_finished(&self, command: &Command) {
        self.push(Event::TurnFinished(command.priority));
    }

    fn run_completed(&self, _report: &RunReport) {
        self.push(Event::RunCompleted);
    }
}

// ============================================================================
// Observers
// ============================================================================

/// Forwards every hook to each contained observer, in insertion order.
#[derive(Default)]
pub struct Observers {
    inner: Vec<Box<dyn RunObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    pub fn with(mut self, observer: impl RunObserver + 'static) -> Self {
        self.inner.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl RunObserver for Observers {
    fn turn_waiting(&self, command: &Command) {
        self.inner.iter().for_each(|o| o.turn_waiting(command));
    }

    fn turn_admitted(&self, command: &Command) {
        self.inner.iter().for_each(|o| o.turn_admitted(command));
    }

    fn guard_acquired(&self, command: &Command, mode: AccessMode) {
        self.inner.iter().for_each(|o| o.guard_acquired(command, mode));
    }

    fn guard_released(&self, command: &Command, mode: AccessMode) {
        self.inner.iter().for_each(|o| o.guard_released(command, mode));
    }

    fn command_completed(&self, command: &Command, outcome: &CommandOutcome) {
        self.inner
            .iter()
            .for_each(|o| o.command_completed(command, outcome));
    }

    fn turn_finished(&self, command: &Command) {
        self.inner.iter().for_each(|o| o.turn_finished(command));
    }

    fn run_completed(&self, report: &RunReport) {
        self.inner.iter().for_each(|o| o.run_completed(report));
    }
}
