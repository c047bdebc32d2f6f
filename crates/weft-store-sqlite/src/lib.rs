//! SQLite backend for the weft ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Committed commands are kept in an
//! append-only, hash-chained journal that is replayed into a
//! [`weft_core::ledger::Ledger`] on open.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod journal;

pub use error::{Error, Result};
pub use journal::{ChainHead, JournalEntry, JournalReport};
pub use store::SqliteStore;
