//! Core types and the registry engine for the weft traceability ledger.
//!
//! Four registries (material sourcing, processing verification,
//! certification, consumer verification) each own their entity arenas and an
//! owner-gated [`access::AccessControl`]. They reference one another only by
//! id, resolved through the read-only traits in [`directory`]. The composed
//! [`ledger::Ledger`] wires those dependencies and is what storage backends
//! host behind [`store::LedgerStore`].
//!
//! This crate is deliberately free of HTTP and database dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod arena;
pub mod certification;
pub mod command;
pub mod consumer;
pub mod directory;
pub mod error;
pub mod kind;
pub mod ledger;
pub mod lifecycle;
pub mod material;
pub mod memory;
pub mod primitives;
pub mod processing;
pub mod store;

pub use error::{AsLedgerError, Error, Result};
