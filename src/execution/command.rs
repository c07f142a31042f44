//! Parsed commands.

use std::fmt;
use std::str::FromStr;

use crate::common::Priority;
use crate::concurrency::AccessMode;
use crate::store::one_at_a_time;

/// The five command kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Insert,
    Update,
    Delete,
    Search,
    Print,
}

impl CommandKind {
    /// Guard mode the command needs while it runs.
    pub fn access_mode(self) -> AccessMode {
        match self {
            CommandKind::Search | CommandKind::Print => AccessMode::Shared,
            CommandKind::Insert | CommandKind::Update | CommandKind::Delete => {
                AccessMode::Exclusive
            }
        }
    }

    /// Upper-case name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Insert => "INSERT",
            CommandKind::Update => "UPDATE",
            CommandKind::Delete => "DELETE",
            CommandKind::Search => "SEARCH",
            CommandKind::Print => "PRINT",
        }
    }
}

/// Error returned when a command keyword is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command `{0}`")]
pub struct UnknownCommand(pub String);

impl FromStr for CommandKind {
    type Err = UnknownCommand;

    /// Case-insensitive; `updatesalary` is accepted as an alias for update.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insert" => Ok(CommandKind::Insert),
            "update" | "updatesalary" => Ok(CommandKind::Update),
            "delete" => Ok(CommandKind::Delete),
            "search" => Ok(CommandKind::Search),
            "print" => Ok(CommandKind::Print),
            _ => Err(UnknownCommand(s.trim().to_string())),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One command of a batch. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    /// Record name; empty for print.
    pub name: String,
    /// Value for insert/update; zero otherwise.
    pub value: u32,
    pub priority: Priority,
    /// 1-based source line, 0 when built in code.
    pub line: usize,
}

impl Command {
    pub fn insert(name: impl Into<String>, value: u32, priority: i32) -> Self {
        Self::build(CommandKind::Insert, name.into(), value, priority)
    }

    pub fn update(name: impl Into<String>, value: u32, priority: i32) -> Self {
        Self::build(CommandKind::Update, name.into(), value, priority)
    }

    pub fn delete(name: impl Into<String>, priority: i32) -> Self {
        Self::build(CommandKind::Delete, name.into(), 0, priority)
    }

    pub fn search(name: impl Into<String>, priority: i32) -> Self {
        Self::build(CommandKind::Search, name.into(), 0, priority)
    }

    pub fn print(priority: i32) -> Self {
        Self::build(CommandKind::Print, String::new(), 0, priority)
    }

    fn build(kind: CommandKind, name: String, value: u32, priority: i32) -> Self {
        Self {
            kind,
            name,
            value,
            priority: Priority::new(priority),
            line: 0,
        }
    }

    /// Attach the source line it was parsed from.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Guard mode this command needs.
    pub fn access_mode(&self) -> AccessMode {
        self.kind.access_mode()
    }

    /// Hash of the command's record name.
    pub fn hash(&self) -> u32 {
        one_at_a_time(&self.name)
    }
}

/// Log form: `INSERT,<hash>,<name>,<value>`, `DELETE,<hash>,<name>`, `PRINT`.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CommandKind::Insert | CommandKind::Update => {
                write!(f, "{},{},{},{}", self.kind, self.hash(), self.name, self.value)
            }
            CommandKind::Delete | CommandKind::Search => {
                write!(f, "{},{},{}", self.kind, self.hash(), self.name)
            }
            CommandKind::Print => write!(f, "{}", self.kind),
        }
    }
}
