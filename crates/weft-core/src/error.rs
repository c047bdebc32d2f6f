//! Error types for `weft-core`.

use thiserror::Error;

use crate::{
  access::Operation,
  kind::EntityKind,
  primitives::{EntityId, Principal, Timestamp},
};

/// Every failure leaves the ledger unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("{caller} is not authorized to {operation}")]
  Unauthorized { caller: Principal, operation: Operation },

  #[error("{kind} {id} not found")]
  NotFound { kind: EntityKind, id: EntityId },

  #[error("out of range: {0}")]
  InvalidRange(String),

  #[error("context time {now} precedes last commit at {last}")]
  ClockRegression { now: Timestamp, last: Timestamp },

  #[error("identifier space exhausted for {0}")]
  IdentifierSpaceExhausted(EntityKind),

  #[error("malformed qr-code hash: {0}")]
  MalformedHash(String),
}

impl Error {
  pub(crate) fn not_found(kind: EntityKind, id: EntityId) -> Self {
    Self::NotFound { kind, id }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Recover the ledger-level error from a backend error, so outer layers can
/// classify failures without knowing the backend.
pub trait AsLedgerError {
  fn ledger_error(&self) -> Option<&Error>;
}

impl AsLedgerError for Error {
  fn ledger_error(&self) -> Option<&Error> { Some(self) }
}
