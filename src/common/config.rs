//! Configuration constants and run options for turnkv.

use std::fmt;

/// Number of buckets in the store's hash index.
///
/// Records land in bucket `key_hash % BUCKET_COUNT`.
pub const BUCKET_COUNT: usize = 1024;

/// Maximum length of a record name, in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// Default command file read by the binary.
pub const DEFAULT_COMMANDS_FILE: &str = "commands.txt";

/// Default thread log written by the binary.
pub const DEFAULT_LOG_FILE: &str = "hash.log";

/// Default outcome file written by the binary.
pub const DEFAULT_OUTPUT_FILE: &str = "output.txt";

/// What `insert` does when the name is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Overwrite the value in place and report the previous one.
    #[default]
    Merge,
    /// Leave the record untouched and report a duplicate.
    Reject,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Merge => write!(f, "merge"),
            DuplicatePolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Options for a single dispatcher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Insert behaviour for names that already exist.
    pub duplicate_policy: DuplicatePolicy,
    /// Take a final ordered snapshot once every worker has joined.
    pub final_print: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Merge,
            final_print: true,
        }
    }
}
