//! Common types and utilities shared across turnkv.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and run options
//! - Error types
//! - Identifiers (Priority, Ticket)

pub mod config;
pub mod error;
mod priority;
mod ticket;

pub use error::{Error, Result};
pub use priority::Priority;
pub use ticket::Ticket;
