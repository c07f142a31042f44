//! Command file loading.
//!
//! One command per line, comma separated, fields trimmed:
//!
//! ```text
//! threads,6
//! insert,alice,100,0
//! insert,bob,200,1
//! updatesalary,alice,150,2
//! delete,bob,3
//! search,alice,0,4
//! print,5
//! ```
//!
//! - Blank lines and lines starting with `#` are skipped.
//! - An optional `threads,N` header must match the number of commands.
//! - Delete and search take `name,priority` or `name,<ignored>,priority`.
//! - Print takes its priority from the last field.

use std::fs;
use std::path::Path;

use crate::common::config::MAX_NAME_LEN;
use crate::common::{Error, Priority, Result};
use crate::execution::{Command, CommandKind};

/// Read and parse a command file.
///
/// # Errors
/// - `Error::Io` if the file cannot be read
/// - `Error::Parse` / `Error::CountMismatch` as in [`parse_commands`]
pub fn load_commands(path: impl AsRef<Path>) -> Result<Vec<Command>> {
    let text = fs::read_to_string(path.as_ref())?;
    let commands = parse_commands(&text)?;
    tracing::debug!(
        path = %path.as_ref().display(),
        count = commands.len(),
        "commands loaded"
    );
    Ok(commands)
}

/// Parse command file text.
///
/// # Errors
/// - `Error::Parse` for a malformed line (with its 1-based line number)
/// - `Error::CountMismatch` if a `threads,N` header disagrees with the body
pub fn parse_commands(text: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    let mut expected = None;
    let mut seen_content = false;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        if !seen_content && fields[0].eq_ignore_ascii_case("threads") {
            expected = Some(parse_thread_count(&fields, line_no)?);
            seen_content = true;
            continue;
        }
        seen_content = true;

        commands.push(parse_line(&fields, line_no)?);
    }

    if let Some(expected) = expected {
        if expected != commands.len() {
            return Err(Error::CountMismatch {
                expected,
                found: commands.len(),
            });
        }
    }

    Ok(commands)
}

fn parse_thread_count(fields: &[&str], line: usize) -> Result<usize> {
    let token = fields
        .get(1)
        .ok_or_else(|| Error::parse(line, "missing thread count"))?;
    match token.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::parse(line, format!("invalid thread count `{}`", token))),
    }
}

/// Parse one command from its trimmed fields.
fn parse_line(fields: &[&str], line: usize) -> Result<Command> {
    let kind = fields[0]
        .parse::<CommandKind>()
        .map_err(|e| Error::parse(line, e.to_string()))?;
    let args = &fields[1..];

    let command = match kind {
        CommandKind::Insert | CommandKind::Update => {
            if args.len() < 3 {
                return Err(Error::parse(
                    line,
                    format!("{} expects name,value,priority", kind),
                ));
            }
            Command {
                kind,
                name: parse_name(args[0], line)?,
                value: parse_value(args[1], line)?,
                priority: parse_priority(args[2], line)?,
                line,
            }
        }
        CommandKind::Delete | CommandKind::Search => {
            let (name, priority) = match args {
                [name, priority] | [name, _, priority, ..] => (*name, *priority),
                _ => {
                    return Err(Error::parse(line, format!("{} expects name,priority", kind)));
                }
            };
            Command {
                kind,
                name: parse_name(name, line)?,
                value: 0,
                priority: parse_priority(priority, line)?,
                line,
            }
        }
        CommandKind::Print => {
            let priority = args
                .last()
                .ok_or_else(|| Error::parse(line, "PRINT expects a priority"))?;
            Command {
                kind,
                name: String::new(),
                value: 0,
                priority: parse_priority(priority, line)?,
                line,
            }
        }
    };

    Ok(command)
}

fn parse_name(token: &str, line: usize) -> Result<String> {
    if token.is_empty() {
        return Err(Error::parse(line, "empty name"));
    }
    if token.len() > MAX_NAME_LEN {
        return Err(Error::parse(
            line,
            format!("name exceeds {} bytes", MAX_NAME_LEN),
        ));
    }
    Ok(token.to_string())
}

fn parse_value(token: &str, line: usize) -> Result<u32> {
    token
        .parse()
        .map_err(|_| Error::parse(line, format!("invalid value `{}`", token)))
}

fn parse_priority(token: &str, line: usize) -> Result<Priority> {
    token
        .parse()
        .map_err(|_| Error::parse(line, format!("invalid priority `{}`", token)))
}
