//! Error type for `weft-store-sqlite`.

use thiserror::Error;
use weft_core::AsLedgerError;

#[derive(Debug, Error)]
pub enum Error {
  /// The command was rejected by the ledger; nothing was journaled.
  #[error(transparent)]
  Ledger(#[from] weft_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("value {0} does not fit in an sqlite integer")]
  IntegerRange(String),

  /// A stored hash does not match its recomputation.
  #[error("journal chain broken at entry {seq}")]
  TamperDetected { seq: u64 },

  /// A journaled command failed to re-apply while rebuilding the ledger.
  #[error("journal entry {seq} failed to replay: {source}")]
  Replay {
    seq:    u64,
    #[source]
    source: weft_core::Error,
  },

  /// A previous append failed and the ledger could not be rebuilt; the store
  /// refuses further writes until reopened.
  #[error("store is poisoned; reopen it to resume writes")]
  Poisoned,
}

impl AsLedgerError for Error {
  fn ledger_error(&self) -> Option<&weft_core::Error> {
    match self {
      Self::Ledger(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
