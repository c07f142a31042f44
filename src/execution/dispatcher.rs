//! Dispatcher - spawns one worker per command and joins them.

use std::any::Any;
use std::thread;

use crate::common::config::RunOptions;
use crate::common::{Error, Result, Ticket};
use crate::concurrency::{AccessGuard, GuardStatsSnapshot, TurnScheduler};
use crate::execution::worker::run_command;
use crate::execution::{Command, CommandOutcome, RunObserver};
use crate::store::{Record, Store};

/// Result of one command in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub ticket: Ticket,
    pub command: Command,
    pub outcome: CommandOutcome,
}

/// Aggregate result of a run, produced once every worker has joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// One entry per command, in input order.
    pub outcomes: Vec<WorkerReport>,

    /// Guard traffic since the dispatcher was created, including the
    /// final snapshot's read.
    pub guard_stats: GuardStatsSnapshot,

    /// Ordered store contents after the run, when `final_print` is set.
    pub final_snapshot: Option<Vec<Record>>,
}

impl RunReport {
    /// Outcome of the command at `ticket`.
    pub fn outcome(&self, ticket: Ticket) -> Option<&CommandOutcome> {
        self.outcomes.get(ticket.0).map(|r| &r.outcome)
    }

    /// Number of failed commands.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|r| r.outcome.is_failure()).count()
    }
}

/// Runs command batches against a store it owns.
///
/// The store outlives individual runs, so consecutive batches see each
/// other's effects.
///
/// # Usage
/// ```
/// use turnkv::common::config::RunOptions;
/// use turnkv::execution::{Command, Dispatcher};
///
/// let dispatcher = Dispatcher::new(RunOptions::default());
/// let commands = vec![
///     Command::insert("alice", 100, 0),
///     Command::search("alice", 1),
/// ];
/// let report = dispatcher.run(&commands, &()).unwrap();
/// assert_eq!(report.outcomes.len(), 2);
/// ```
pub struct Dispatcher {
    access: AccessGuard,
    options: RunOptions,
}

impl Dispatcher {
    /// Create a dispatcher with an empty store.
    pub fn new(options: RunOptions) -> Self {
        Self {
            access: AccessGuard::new(Store::with_policy(options.duplicate_policy)),
            options,
        }
    }

    /// Options this dispatcher was built with.
    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// The guarded store.
    pub fn access(&self) -> &AccessGuard {
        &self.access
    }

    /// Run a batch, one thread per command.
    ///
    /// # Errors
    /// - `Error::EmptyBatch` if `commands` is empty
    /// - `Error::WorkerSpawn` if a worker thread could not be started; the
    ///   workers already running are joined first and the unstarted
    ///   commands are withdrawn from the scheduler
    pub fn run(&self, commands: &[Command], observer: &dyn RunObserver) -> Result<RunReport> {
        if commands.is_empty() {
            return Err(Error::EmptyBatch);
        }

        tracing::debug!(commands = commands.len(), "run started");

        let scheduler = TurnScheduler::new(commands.iter().map(|c| c.priority));
        let mut spawn_error = None;

        let outcomes = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(commands.len());

            for (index, command) in commands.iter().enumerate() {
                let ticket = Ticket::new(index);

                if spawn_error.is_some() {
                    scheduler.withdraw(ticket);
                    continue;
                }

                let scheduler = &scheduler;
                let access = &self.access;
                let spawned = thread::Builder::new()
                    .name(format!("worker-{}", index))
                    .spawn_scoped(scope, move || {
                        run_command(ticket, command, scheduler, access, observer)
                    });

                match spawned {
                    Ok(handle) => handles.push((ticket, command, handle)),
                    Err(source) => {
                        tracing::error!(%ticket, error = %source, "worker spawn failed");
                        scheduler.withdraw(ticket);
                        spawn_error = Some(Error::WorkerSpawn { ticket, source });
                    }
                }
            }

            handles
                .into_iter()
                .map(|(ticket, command, handle)| {
                    let outcome = handle.join().unwrap_or_else(|payload| {
                        let reason = panic_message(payload.as_ref());
                        tracing::error!(%ticket, %reason, "worker panicked");
                        CommandOutcome::Failed(format!("worker panicked: {}", reason))
                    });
                    WorkerReport {
                        ticket,
                        command: command.clone(),
                        outcome,
                    }
                })
                .collect::<Vec<_>>()
        });

        if let Some(err) = spawn_error {
            return Err(err);
        }

        let final_snapshot = self
            .options
            .final_print
            .then(|| self.access.read().snapshot());

        let report = RunReport {
            outcomes,
            guard_stats: self.access.stats().snapshot(),
            final_snapshot,
        };

        observer.run_completed(&report);
        Ok(report)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(RunOptions::default())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::DuplicatePolicy;

    #[test]
    fn test_empty_batch_rejected() {
        let dispatcher = Dispatcher::default();
        assert!(matches!(dispatcher.run(&[], &()), Err(Error::EmptyBatch)));
    }

    #[test]
    fn test_outcomes_in_input_order() {
        let dispatcher = Dispatcher::default();
        let commands = vec![
            Command::search("alice", 1),
            Command::insert("alice", 100, 0),
        ];

        let report = dispatcher.run(&commands, &()).unwrap();

        assert_eq!(report.outcomes[0].ticket, Ticket::new(0));
        // Search ran second despite being listed first
        assert_eq!(
            report.outcome(Ticket::new(0)),
            Some(&CommandOutcome::Found(Record::new("alice", 100)))
        );
        assert_eq!(report.failures(), 0);
    }

    #[test]
    fn test_final_snapshot_toggle() {
        let commands = vec![Command::insert("alice", 1, 0)];

        let with = Dispatcher::default().run(&commands, &()).unwrap();
        assert_eq!(with.final_snapshot, Some(vec![Record::new("alice", 1)]));
        // Insert write + final read
        assert_eq!(with.guard_stats.acquisitions(), 2);

        let without = Dispatcher::new(RunOptions {
            final_print: false,
            ..RunOptions::default()
        })
        .run(&commands, &())
        .unwrap();
        assert_eq!(without.final_snapshot, None);
        assert_eq!(without.guard_stats.acquisitions(), 1);
    }

    #[test]
    fn test_reject_policy() {
        let dispatcher = Dispatcher::new(RunOptions {
            duplicate_policy: DuplicatePolicy::Reject,
            ..RunOptions::default()
        });
        let commands = vec![Command::insert("a", 1, 0), Command::insert("a", 2, 1)];

        let report = dispatcher.run(&commands, &()).unwrap();
        assert_eq!(
            report.outcome(Ticket::new(1)),
            Some(&CommandOutcome::Duplicate(Record::new("a", 1)))
        );
    }

    #[test]
    fn test_store_persists_across_runs() {
        let dispatcher = Dispatcher::default();
        dispatcher
            .run(&[Command::insert("carry", 9, 0)], &())
            .unwrap();

        let report = dispatcher.run(&[Command::search("carry", 0)], &()).unwrap();
        assert_eq!(
            report.outcome(Ticket::new(0)),
            Some(&CommandOutcome::Found(Record::new("carry", 9)))
        );
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
