//! Integration tests for priority-ordered dispatch.
//!
//! These tests run real worker threads and check cross-component ordering
//! through the recorded observer events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use turnkv::concurrency::{AccessMode, GuardStats};
use turnkv::execution::observer::Event;
use turnkv::execution::EventRecorder;
use turnkv::store::one_at_a_time;
use turnkv::{
    Command, CommandOutcome, Dispatcher, Priority, Record, RunObserver, RunOptions, Ticket,
};

fn reference_batch() -> Vec<Command> {
    vec![
        Command::insert("alice", 100, 0),
        Command::insert("bob", 200, 1),
        Command::update("alice", 150, 2),
        Command::delete("bob", 3),
        Command::search("alice", 4),
        Command::print(5),
    ]
}

/// Every guard acquisition of round `k` comes after every guard release of
/// all rounds below `k`.
fn assert_rounds_serialized(events: &[Event]) {
    for (i, event) in events.iter().enumerate() {
        if let Event::GuardAcquired(p, _) = event {
            for later in &events[i + 1..] {
                if let Event::GuardReleased(q, _) = later {
                    assert!(
                        q >= p,
                        "round {} released after round {} acquired",
                        q,
                        p
                    );
                }
            }
        }
    }
}

/// The reference scenario from start to finish.
#[test]
fn test_reference_scenario() {
    let dispatcher = Dispatcher::new(RunOptions::default());
    let recorder = EventRecorder::new();

    let report = dispatcher.run(&reference_batch(), &recorder).unwrap();

    let store = dispatcher.access().read();
    assert_eq!(store.find("alice").unwrap().value, 150);
    assert_eq!(store.find("bob"), None);
    assert_eq!(
        store.snapshot(),
        vec![Record {
            hash: one_at_a_time("alice"),
            name: "alice".into(),
            value: 150,
        }]
    );
    drop(store);

    assert_eq!(
        report.outcome(Ticket::new(4)),
        Some(&CommandOutcome::Found(Record::new("alice", 150)))
    );
    assert_eq!(
        report.outcome(Ticket::new(5)),
        Some(&CommandOutcome::Printed(vec![Record::new("alice", 150)]))
    );
    assert_eq!(
        report.final_snapshot,
        Some(vec![Record::new("alice", 150)])
    );

    let events = recorder.into_events();
    assert_rounds_serialized(&events);
    assert_eq!(events.last(), Some(&Event::RunCompleted));

    // 4 writes + 2 reads + final snapshot
    assert_eq!(report.guard_stats.write_acquisitions, 4);
    assert_eq!(report.guard_stats.read_acquisitions, 3);
    assert!(report.guard_stats.is_balanced());
}

/// Completions arrive strictly in priority order when priorities are distinct,
/// whatever order the commands are listed in.
#[test]
fn test_completion_order_follows_priority() {
    let commands: Vec<Command> = (0..24)
        .rev()
        .map(|p| Command::insert(format!("key{}", p), p as u32, p))
        .collect();

    let dispatcher = Dispatcher::default();
    let recorder = EventRecorder::new();
    dispatcher.run(&commands, &recorder).unwrap();

    let completed: Vec<i32> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Completed(p, _) => Some(p.0),
            _ => None,
        })
        .collect();
    assert_eq!(completed, (0..24).collect::<Vec<_>>());
}

/// Two same-priority writers both land; the later one in guard order wins.
#[test]
fn test_same_priority_writers() {
    for _ in 0..20 {
        let commands = vec![
            Command::insert("shared", 1, 0),
            Command::insert("shared", 2, 0),
            Command::search("shared", 1),
        ];
        let dispatcher = Dispatcher::default();
        let report = dispatcher.run(&commands, &()).unwrap();

        let first = report.outcome(Ticket::new(0)).unwrap();
        let second = report.outcome(Ticket::new(1)).unwrap();

        // Exactly one insert created the record, the other merged into it.
        let (created, merged) = match (first, second) {
            (CommandOutcome::Inserted(_), CommandOutcome::Updated { .. }) => (first, second),
            (CommandOutcome::Updated { .. }, CommandOutcome::Inserted(_)) => (second, first),
            other => panic!("unexpected outcomes {:?}", other),
        };

        let CommandOutcome::Updated { before, after } = merged else {
            unreachable!()
        };
        let CommandOutcome::Inserted(created) = created else {
            unreachable!()
        };
        assert_eq!(before, created);
        assert_eq!(
            report.outcome(Ticket::new(2)),
            Some(&CommandOutcome::Found(after.clone()))
        );
    }
}

/// Same-priority readers share the guard at the same time.
#[test]
fn test_same_priority_readers_overlap() {
    /// Holds each read guard until another reader holds one too, then
    /// records how many shared guards were outstanding.
    struct OverlapMeter<'a> {
        stats: &'a GuardStats,
        max_outstanding: AtomicU64,
    }

    impl RunObserver for OverlapMeter<'_> {
        fn guard_acquired(&self, _command: &Command, mode: AccessMode) {
            if mode != AccessMode::Shared {
                return;
            }
            let deadline = Instant::now() + Duration::from_secs(5);
            loop {
                let snapshot = self.stats.snapshot();
                let outstanding = snapshot.read_acquisitions - snapshot.read_releases;
                self.max_outstanding.fetch_max(outstanding, Ordering::SeqCst);
                if outstanding >= 2 || Instant::now() >= deadline {
                    break;
                }
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    let commands: Vec<Command> = (0..4).map(|_| Command::search("x", 0)).collect();
    let dispatcher = Dispatcher::new(RunOptions {
        final_print: false,
        ..RunOptions::default()
    });
    let overlap = OverlapMeter {
        stats: dispatcher.access().stats(),
        max_outstanding: AtomicU64::new(0),
    };

    dispatcher.run(&commands, &overlap).unwrap();

    assert!(overlap.max_outstanding.load(Ordering::SeqCst) >= 2);
    assert!(dispatcher.access().stats().snapshot().is_balanced());
}

/// Failed deletes do not disturb the store.
#[test]
fn test_missing_delete_is_idempotent() {
    let commands = vec![
        Command::insert("keep", 1, 0),
        Command::print(1),
        Command::delete("ghost", 2),
        Command::print(3),
    ];
    let report = Dispatcher::default().run(&commands, &()).unwrap();

    assert!(matches!(
        report.outcome(Ticket::new(2)),
        Some(CommandOutcome::NotFound { .. })
    ));
    assert_eq!(report.outcome(Ticket::new(1)), report.outcome(Ticket::new(3)));
}

/// A panicking worker is reported as failed and does not stall later rounds.
#[test]
fn test_worker_panic_is_contained() {
    struct PanicsAt(Priority);
    impl RunObserver for PanicsAt {
        fn turn_admitted(&self, command: &Command) {
            if command.priority == self.0 {
                panic!("injected failure");
            }
        }
    }

    let commands = vec![
        Command::insert("a", 1, 0),
        Command::insert("b", 2, 1),
        Command::insert("c", 3, 2),
    ];
    let dispatcher = Dispatcher::default();
    let report = dispatcher
        .run(&commands, &PanicsAt(Priority::new(1)))
        .unwrap();

    match report.outcome(Ticket::new(1)) {
        Some(CommandOutcome::Failed(reason)) => assert!(reason.contains("injected failure")),
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert_eq!(report.failures(), 1);

    let mut expected = vec![Record::new("a", 1), Record::new("c", 3)];
    expected.sort();
    assert_eq!(report.final_snapshot, Some(expected));
}

/// A worker that panics before reaching the gate is withdrawn, so the
/// rounds above it still run.
#[test]
fn test_panic_before_gate_is_contained() {
    struct PanicsWhileWaiting(Priority);
    impl RunObserver for PanicsWhileWaiting {
        fn turn_waiting(&self, command: &Command) {
            if command.priority == self.0 {
                panic!("failed before the gate");
            }
        }
    }

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let commands = vec![
            Command::insert("a", 1, 0),
            Command::insert("b", 2, 1),
            Command::insert("c", 3, 2),
        ];
        let result = Dispatcher::default().run(&commands, &PanicsWhileWaiting(Priority::new(1)));
        let _ = tx.send(result);
    });

    let report = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("run stalled behind the failed worker")
        .unwrap();

    match report.outcome(Ticket::new(1)) {
        Some(CommandOutcome::Failed(reason)) => {
            assert!(reason.contains("failed before the gate"))
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert_eq!(report.failures(), 1);
    assert!(report.guard_stats.is_balanced());

    let mut expected = vec![Record::new("a", 1), Record::new("c", 3)];
    expected.sort();
    assert_eq!(report.final_snapshot, Some(expected));
}

/// Non-contiguous and repeated priorities still drain completely.
#[test]
fn test_sparse_priorities() {
    let commands = vec![
        Command::insert("a", 1, 100),
        Command::insert("b", 2, -7),
        Command::insert("c", 3, 100),
        Command::delete("b", 42),
        Command::print(1000),
    ];
    let report = Dispatcher::default().run(&commands, &()).unwrap();

    let mut expected = vec![Record::new("a", 1), Record::new("c", 3)];
    expected.sort();
    assert_eq!(
        report.outcome(Ticket::new(4)),
        Some(&CommandOutcome::Printed(expected))
    );
}
