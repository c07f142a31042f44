//! Worker - the life of one command.
//!
//! ```text
//! await_turn ──▶ acquire guard ──▶ execute ──▶ release guard ──▶ finish turn
//! ```
//!
//! A worker that dies before reaching the gate withdraws its ticket.
//! The guard is only requested after admission and is released before the
//! turn finishes, so lock contention never influences round order and no
//! lock is held across the turn wait.

use crate::common::{Error, Ticket};
use crate::concurrency::{AccessGuard, AccessMode, TurnScheduler};
use crate::execution::{Command, CommandKind, CommandOutcome, RunObserver};
use crate::store::{InsertOutcome, Store};

/// Run one command to completion on the calling thread.
///
/// Store-level failures become [`CommandOutcome::Failed`]; they never
/// propagate to sibling workers.
pub fn run_command(
    ticket: Ticket,
    command: &Command,
    scheduler: &TurnScheduler,
    access: &AccessGuard,
    observer: &dyn RunObserver,
) -> CommandOutcome {
    // Withdrawn if the waiting hook unwinds.
    let pending = scheduler.reserve(ticket);
    observer.turn_waiting(command);
    let turn = pending.await_turn();
    observer.turn_admitted(command);

    let mode = command.access_mode();
    let outcome = match mode {
        AccessMode::Shared => {
            let store = access.read();
            observer.guard_acquired(command, mode);
            let outcome = execute_read(&store, command);
            drop(store);
            outcome
        }
        AccessMode::Exclusive => {
            let mut store = access.write();
            observer.guard_acquired(command, mode);
            let outcome = execute_write(&mut store, command);
            drop(store);
            outcome
        }
    };
    observer.guard_released(command, mode);
    observer.command_completed(command, &outcome);

    turn.finish();
    observer.turn_finished(command);

    outcome
}

/// Search and print, under the shared guard.
fn execute_read(store: &Store, command: &Command) -> CommandOutcome {
    match command.kind {
        CommandKind::Search => match store.find(&command.name) {
            Some(record) => CommandOutcome::Found(record),
            None => not_found(command),
        },
        CommandKind::Print => CommandOutcome::Printed(store.snapshot()),
        kind => unreachable!("{} is not a read command", kind),
    }
}

/// Insert, update and delete, under the exclusive guard.
fn execute_write(store: &mut Store, command: &Command) -> CommandOutcome {
    match command.kind {
        CommandKind::Insert => match store.insert(&command.name, command.value) {
            Ok(InsertOutcome::Inserted(record)) => CommandOutcome::Inserted(record),
            Ok(InsertOutcome::Updated { previous, current }) => CommandOutcome::Updated {
                before: previous,
                after: current,
            },
            Ok(InsertOutcome::Duplicate(record)) => CommandOutcome::Duplicate(record),
            Err(err @ (Error::NameTooLong { .. } | Error::OutOfMemory)) => {
                CommandOutcome::Failed(err.to_string())
            }
            Err(err) => CommandOutcome::Failed(format!("unexpected store error: {}", err)),
        },
        CommandKind::Update => match store.update(&command.name, command.value) {
            Some((before, after)) => CommandOutcome::Updated { before, after },
            None => not_found(command),
        },
        CommandKind::Delete => match store.delete(&command.name) {
            Some(record) => CommandOutcome::Deleted(record),
            None => not_found(command),
        },
        kind => unreachable!("{} is not a write command", kind),
    }
}

fn not_found(command: &Command) -> CommandOutcome {
    CommandOutcome::NotFound {
        name: command.name.clone(),
        hash: command.hash(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::MAX_NAME_LEN;
    use crate::execution::observer::{Event, EventRecorder};
    use crate::common::Priority;
    use crate::concurrency::TurnState;
    use crate::store::Record;

    fn run_alone(command: Command, access: &AccessGuard) -> CommandOutcome {
        let scheduler = TurnScheduler::new([command.priority]);
        run_command(Ticket::new(0), &command, &scheduler, access, &())
    }

    #[test]
    fn test_each_kind() {
        let access = AccessGuard::default();

        assert_eq!(
            run_alone(Command::insert("alice", 100, 0), &access),
            CommandOutcome::Inserted(Record::new("alice", 100))
        );
        assert_eq!(
            run_alone(Command::update("alice", 150, 0), &access),
            CommandOutcome::Updated {
                before: Record::new("alice", 100),
                after: Record::new("alice", 150),
            }
        );
        assert_eq!(
            run_alone(Command::search("alice", 0), &access),
            CommandOutcome::Found(Record::new("alice", 150))
        );
        assert_eq!(
            run_alone(Command::print(0), &access),
            CommandOutcome::Printed(vec![Record::new("alice", 150)])
        );
        assert_eq!(
            run_alone(Command::delete("alice", 0), &access),
            CommandOutcome::Deleted(Record::new("alice", 150))
        );
        assert!(matches!(
            run_alone(Command::delete("alice", 0), &access),
            CommandOutcome::NotFound { .. }
        ));
    }

    #[test]
    fn test_store_error_becomes_failed() {
        let access = AccessGuard::default();
        let long = "z".repeat(MAX_NAME_LEN + 1);

        let outcome = run_alone(Command::insert(long, 1, 0), &access);
        assert!(outcome.is_failure());
        assert!(access.read().is_empty());
    }

    #[test]
    fn test_waiting_hook_panic_withdraws_ticket() {
        struct Explodes;
        impl RunObserver for Explodes {
            fn turn_waiting(&self, _command: &Command) {
                panic!("hook failed");
            }
        }

        let access = AccessGuard::default();
        let command = Command::insert("a", 1, 0);
        let scheduler = TurnScheduler::new([command.priority, Priority::new(1)]);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run_command(Ticket::new(0), &command, &scheduler, &access, &Explodes)
        }));

        assert!(result.is_err());
        assert_eq!(scheduler.state_of(Ticket::new(0)), TurnState::Finished);
        assert_eq!(scheduler.current_priority(), Some(Priority::new(1)));
        assert!(access.read().is_empty());
    }

    #[test]
    fn test_hook_order() {
        let access = AccessGuard::default();
        let recorder = EventRecorder::new();
        let command = Command::search("nobody", 2);
        let scheduler = TurnScheduler::new([command.priority]);

        run_command(Ticket::new(0), &command, &scheduler, &access, &recorder);

        let p = Priority::new(2);
        assert_eq!(
            recorder.into_events(),
            vec![
                Event::TurnWaiting(p),
                Event::TurnAdmitted(p),
                Event::GuardAcquired(p, AccessMode::Shared),
                Event::GuardReleased(p, AccessMode::Shared),
                Event::Completed(
                    p,
                    CommandOutcome::NotFound {
                        name: "nobody".into(),
                        hash: crate::store::one_at_a_time("nobody"),
                    }
                ),
                Event::TurnFinished(p),
            ]
        );
        assert!(access.stats().snapshot().is_balanced());
        assert_eq!(scheduler.active_count(), 0);
    }
}
