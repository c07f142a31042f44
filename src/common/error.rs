//! Error types for turnkv.

use thiserror::Error;

use crate::common::Ticket;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors that can escape a turnkv operation.
///
/// Per-command misses (not found, duplicate) are not errors; they are
/// reported as [`CommandOutcome`](crate::execution::CommandOutcome) values.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading commands or writing logs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A command file line could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The `threads,N` header disagrees with the number of commands.
    #[error("command count mismatch: header declares {expected}, file has {found}")]
    CountMismatch { expected: usize, found: usize },

    /// A record name exceeds [`MAX_NAME_LEN`](crate::common::config::MAX_NAME_LEN).
    #[error("name `{name}` exceeds {max} bytes")]
    NameTooLong { name: String, max: usize },

    /// The store could not reserve room for a new record.
    #[error("store allocation failed")]
    OutOfMemory,

    /// A run was started without any commands.
    #[error("no commands to process")]
    EmptyBatch,

    /// The worker thread for a command could not be started.
    #[error("failed to spawn worker for {ticket}: {source}")]
    WorkerSpawn {
        ticket: Ticket,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Build a parse error for a 1-based line number.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::parse(3, "unknown command `frobnicate`");
        assert_eq!(format!("{}", err), "line 3: unknown command `frobnicate`");

        let err = Error::CountMismatch {
            expected: 4,
            found: 2,
        };
        assert_eq!(
            format!("{}", err),
            "command count mismatch: header declares 4, file has 2"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_spawn_error_has_source() {
        use std::error::Error as _;

        let err = Error::WorkerSpawn {
            ticket: Ticket::new(2),
            source: std::io::Error::new(std::io::ErrorKind::WouldBlock, "no threads"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("Ticket(2)"));
    }
}
