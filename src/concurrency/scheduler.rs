//! Turn Scheduler - admits command workers in priority rounds.
//!
//! Every command gets a [`Ticket`] and a slot holding its [`Priority`] and
//! [`TurnState`]. A worker calls [`TurnScheduler::await_turn`] and blocks
//! until its priority is the current one. All workers sharing that
//! priority are admitted together (a *round*); the next round is selected
//! only once the active count drops back to zero.
//!
//! ```text
//!  Pending ──await_turn──▶ Waiting ──admitted──▶ Active ──finish──▶ Finished
//!     │                                                                ▲
//!     └──────────────────────────── withdraw ──────────────────────────┘
//! ```

use parking_lot::{Condvar, Mutex};

use crate::common::{Priority, Ticket};

/// Lifecycle of one scheduler slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    /// Registered; the worker has not reached the gate yet.
    Pending,
    /// Blocked in `await_turn`.
    Waiting,
    /// Admitted and running.
    Active,
    /// Done, or withdrawn before it ever ran.
    Finished,
}

impl TurnState {
    /// Not yet admitted: still eligible for round selection.
    #[inline]
    fn is_unadmitted(self) -> bool {
        matches!(self, TurnState::Pending | TurnState::Waiting)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    priority: Priority,
    state: TurnState,
}

/// State behind the scheduler mutex.
#[derive(Debug)]
struct SchedulerState {
    /// Priority of the running round, or `None` before the first round
    /// and after the last.
    current: Option<Priority>,

    /// Workers admitted and not yet finished.
    active: usize,

    /// One slot per ticket.
    slots: Vec<Slot>,
}

impl SchedulerState {
    /// Lowest priority among slots that have not been admitted.
    ///
    /// Active and finished slots never participate: re-selecting one of
    /// them would pick a priority no remaining worker can match.
    fn lowest_unadmitted(&self) -> Option<Priority> {
        self.slots
            .iter()
            .filter(|slot| slot.state.is_unadmitted())
            .map(|slot| slot.priority)
            .min()
    }

    fn select_next_round(&mut self) {
        let next = self.lowest_unadmitted();
        if next != self.current {
            tracing::debug!(from = ?self.current, to = ?next, "round advanced");
        }
        self.current = next;
        self.debug_check_current();
    }

    /// The current round must belong to a live slot (unadmitted or active),
    /// and no unadmitted slot may hold a lower priority.
    fn debug_check_current(&self) {
        if let Some(current) = self.current {
            debug_assert!(
                self.slots.iter().any(|s| s.priority == current
                    && (s.state.is_unadmitted() || s.state == TurnState::Active)),
                "selected priority {} matches no live command",
                current
            );
            debug_assert!(
                !self
                    .slots
                    .iter()
                    .any(|s| s.state.is_unadmitted() && s.priority < current),
                "round {} selected while a lower priority is unadmitted",
                current
            );
        }
    }
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerSnapshot {
    pub current: Option<Priority>,
    pub active: usize,
    pub pending: usize,
    pub waiting: usize,
    pub running: usize,
    pub finished: usize,
}

/// Priority turn-taking gate shared by all workers of one run.
///
/// # Thread Safety
/// - `state`: `Mutex` - the scheduler's own exclusion, never the store lock
/// - `turn_changed`: `Condvar` - broadcast on every state change that can
///   admit someone; each waiter re-checks its own predicate
///
/// # Usage
/// ```
/// use turnkv::concurrency::TurnScheduler;
/// use turnkv::common::{Priority, Ticket};
///
/// let scheduler = TurnScheduler::new([Priority::new(0)]);
/// let turn = scheduler.await_turn(Ticket::new(0));
/// assert_eq!(scheduler.active_count(), 1);
/// turn.finish();
/// assert_eq!(scheduler.active_count(), 0);
/// ```
pub struct TurnScheduler {
    state: Mutex<SchedulerState>,
    turn_changed: Condvar,
}

impl TurnScheduler {
    /// Register one slot per priority; ticket `i` is the `i`-th priority.
    pub fn new(priorities: impl IntoIterator<Item = Priority>) -> Self {
        let slots = priorities
            .into_iter()
            .map(|priority| Slot {
                priority,
                state: TurnState::Pending,
            })
            .collect();

        Self {
            state: Mutex::new(SchedulerState {
                current: None,
                active: 0,
                slots,
            }),
            turn_changed: Condvar::new(),
        }
    }

    // ========================================================================
    // Public API: turn taking
    // ========================================================================

    /// Hold `ticket` while its worker prepares to wait.
    ///
    /// If the returned [`PendingTicket`] is dropped before
    /// [`PendingTicket::await_turn`] is called, the ticket is withdrawn so a
    /// worker that dies early cannot pin the round.
    pub fn reserve(&self, ticket: Ticket) -> PendingTicket<'_> {
        PendingTicket {
            scheduler: self,
            ticket,
            armed: true,
        }
    }

    /// Block until `ticket`'s priority is admitted.
    ///
    /// On return the slot is `Active` and the active count has grown by one.
    /// The returned [`Turn`] finishes the slot when consumed or dropped.
    ///
    /// # Panics
    /// Panics if `ticket` is unknown or has already taken its turn.
    pub fn await_turn(&self, ticket: Ticket) -> Turn<'_> {
        let mut state = self.state.lock();

        let slot = state.slots[ticket.0];
        assert_eq!(
            slot.state,
            TurnState::Pending,
            "{} already took its turn",
            ticket
        );
        state.slots[ticket.0].state = TurnState::Waiting;
        let priority = slot.priority;

        if state.active == 0 {
            // Idle gate: the lowest unadmitted priority (ours included) goes next.
            state.select_next_round();
            self.turn_changed.notify_all();
        }

        while state.current != Some(priority) {
            self.turn_changed.wait(&mut state);
        }

        state.slots[ticket.0].state = TurnState::Active;
        state.active += 1;
        state.debug_check_current();
        tracing::trace!(%ticket, %priority, active = state.active, "turn admitted");

        Turn {
            scheduler: self,
            ticket,
            priority,
            finished: false,
        }
    }

    /// Mark an admitted ticket finished.
    ///
    /// When the active count reaches zero, the next round is the lowest
    /// unadmitted priority (or none). All waiters are woken regardless.
    ///
    /// Prefer [`Turn::finish`]; this is the same operation keyed by ticket.
    ///
    /// # Panics
    /// Panics if `ticket` is not currently active.
    pub fn finish_turn(&self, ticket: Ticket) {
        let mut state = self.state.lock();

        assert_eq!(
            state.slots[ticket.0].state,
            TurnState::Active,
            "{} is not active",
            ticket
        );
        state.slots[ticket.0].state = TurnState::Finished;

        debug_assert!(state.active > 0, "active count underflow");
        state.active -= 1;

        if state.active == 0 {
            state.select_next_round();
        }

        self.turn_changed.notify_all();
    }

    /// Retire a ticket whose worker will never arrive.
    ///
    /// Only pending tickets can be withdrawn; returns whether it was.
    pub fn withdraw(&self, ticket: Ticket) -> bool {
        let mut state = self.state.lock();

        if state.slots[ticket.0].state != TurnState::Pending {
            return false;
        }
        state.slots[ticket.0].state = TurnState::Finished;
        tracing::debug!(%ticket, "ticket withdrawn");

        if state.active == 0 {
            state.select_next_round();
        }
        self.turn_changed.notify_all();
        true
    }

    // ========================================================================
    // Public API: inspection
    // ========================================================================

    /// Priority of the running round.
    pub fn current_priority(&self) -> Option<Priority> {
        self.state.lock().current
    }

    /// Workers currently admitted.
    pub fn active_count(&self) -> usize {
        self.state.lock().active
    }

    /// State of one ticket.
    pub fn state_of(&self, ticket: Ticket) -> TurnState {
        self.state.lock().slots[ticket.0].state
    }

    /// Number of registered tickets.
    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    /// Whether no tickets are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counts per state, taken under one lock.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.state.lock();
        let mut snapshot = SchedulerSnapshot {
            current: state.current,
            active: state.active,
            ..SchedulerSnapshot::default()
        };

        for slot in &state.slots {
            match slot.state {
                TurnState::Pending => snapshot.pending += 1,
                TurnState::Waiting => snapshot.waiting += 1,
                TurnState::Active => snapshot.running += 1,
                TurnState::Finished => snapshot.finished += 1,
            }
        }
        snapshot
    }
}

/// A ticket that has not reached the turn gate yet.
///
/// Dropping it withdraws the ticket.
pub struct PendingTicket<'a> {
    scheduler: &'a TurnScheduler,
    ticket: Ticket,
    armed: bool,
}

impl<'a> PendingTicket<'a> {
    #[inline]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Hand the ticket to the gate. See [`TurnScheduler::await_turn`].
    pub fn await_turn(mut self) -> Turn<'a> {
        self.armed = false;
        self.scheduler.await_turn(self.ticket)
    }
}

impl Drop for PendingTicket<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.scheduler.withdraw(self.ticket);
        }
    }
}

/// An admitted turn.
///
/// Finishing is idempotent: [`Turn::finish`] consumes the turn, and a turn
/// dropped without finishing (e.g. during unwinding) finishes itself so
/// the remaining rounds still run.
pub struct Turn<'a> {
    scheduler: &'a TurnScheduler,
    ticket: Ticket,
    priority: Priority,
    finished: bool,
}

impl Turn<'_> {
    /// Ticket this turn belongs to.
    #[inline]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Priority of the admitted round.
    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Finish the turn, possibly advancing to the next round.
    pub fn finish(mut self) {
        self.finish_internal();
    }

    fn finish_internal(&mut self) {
        if !self.finished {
            self.finished = true;
            self.scheduler.finish_turn(self.ticket);
        }
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        self.finish_internal();
    }
}
