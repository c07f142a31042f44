//! Record - one live key/value association in the store.

use std::cmp::Ordering;
use std::fmt;

use crate::store::one_at_a_time;

/// A stored record.
///
/// Records are owned by the [`Store`](crate::store::Store); every query
/// hands out a clone, so callers never alias store memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    /// One-at-a-time hash of `name`.
    pub hash: u32,
    /// Record name.
    pub name: String,
    /// Stored value.
    pub value: u32,
}

impl Record {
    /// Create a record, hashing the name.
    pub fn new(name: impl Into<String>, value: u32) -> Self {
        let name = name.into();
        Self {
            hash: one_at_a_time(&name),
            name,
            value,
        }
    }
}

/// Snapshot order: ascending hash, ties broken by name.
impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash
            .cmp(&other.hash)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.hash, self.name, self.value)
    }
}
