//! In-memory record store.
//!
//! # Components
//! - [`Store`] - Arena-backed container keyed by name
//! - [`Record`] - A stored `hash,name,value` triple
//! - [`one_at_a_time`] - The name hash

mod hash;
mod record;
mod table;

pub use hash::one_at_a_time;
pub use record::Record;
pub use table::{InsertOutcome, Store};
