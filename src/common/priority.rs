//! Command priority type.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Scheduling key of a command.
///
/// Lower values run earlier. Values need not be contiguous or unique;
/// commands sharing a value form one round and run concurrently.
///
/// # Example
/// ```
/// use turnkv::Priority;
///
/// assert!(Priority::new(0) < Priority::new(1));
/// assert_eq!("7".parse::<Priority>().unwrap(), Priority::new(7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Priority(pub i32);

impl Priority {
    /// Create a new Priority.
    #[inline]
    pub fn new(value: i32) -> Self {
        Priority(value)
    }
}

impl FromStr for Priority {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Priority)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
