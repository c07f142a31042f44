//! Scheduler ticket type.

use std::fmt;

/// Identifies one command's slot in the turn scheduler.
///
/// Tickets are positions in the command batch, so the dispatcher can
/// index both the command list and the scheduler slots with `ticket.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(pub usize);

impl Ticket {
    /// Create a new Ticket.
    #[inline]
    pub fn new(index: usize) -> Self {
        Ticket(index)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket({})", self.0)
    }
}
