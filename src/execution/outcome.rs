//! Per-command results.

use std::fmt;

use crate::store::Record;

/// What a command did to (or saw in) the store.
///
/// Misses and duplicates are ordinary outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Insert created a record.
    Inserted(Record),
    /// Insert of an existing name, or update, changed a value.
    Updated { before: Record, after: Record },
    /// Insert of an existing name under the reject policy.
    Duplicate(Record),
    /// Delete removed a record.
    Deleted(Record),
    /// Search found a record.
    Found(Record),
    /// Update, delete or search found nothing.
    NotFound { name: String, hash: u32 },
    /// Print captured an ordered snapshot.
    Printed(Vec<Record>),
    /// The command could not complete; siblings are unaffected.
    Failed(String),
}

impl CommandOutcome {
    /// Whether the command changed the store.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            CommandOutcome::Inserted(_) | CommandOutcome::Updated { .. } | CommandOutcome::Deleted(_)
        )
    }

    /// Whether the command failed outright.
    pub fn is_failure(&self) -> bool {
        matches!(self, CommandOutcome::Failed(_))
    }
}

/// One-line rendering; print spans several lines.
impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Inserted(r) => write!(f, "Inserted {}", r),
            CommandOutcome::Updated { before, after } => {
                write!(f, "Updated record {} from {} to {}", after.hash, before, after)
            }
            CommandOutcome::Duplicate(r) => {
                write!(f, "Insert failed. Entry {} is a duplicate.", r.hash)
            }
            CommandOutcome::Deleted(r) => write!(f, "Deleted record for {}", r),
            CommandOutcome::Found(r) => write!(f, "Found: {}", r),
            CommandOutcome::NotFound { name, hash } => {
                write!(f, "{} not found (hash {}).", name, hash)
            }
            CommandOutcome::Printed(records) => {
                write!(f, "Current Database:")?;
                for record in records {
                    write!(f, "\n{}", record)?;
                }
                Ok(())
            }
            CommandOutcome::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}
