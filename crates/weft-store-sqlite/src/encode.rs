//! Conversions between domain values and SQLite column representations.
//!
//! SQLite integers are signed 64-bit; sequence numbers and timestamps are
//! `u64` in the domain, so every crossing is checked. Commands and the ledger
//! configuration are stored as compact JSON.

use weft_core::{
  command::Command,
  ledger::LedgerConfig,
  primitives::{Principal, Timestamp},
};

use crate::{Error, Result, journal::JournalEntry};

// ─── Integers ─────────────────────────────────────────────────────────────────

pub fn encode_u64(value: u64) -> Result<i64> {
  i64::try_from(value).map_err(|_| Error::IntegerRange(value.to_string()))
}

pub fn decode_u64(value: i64) -> Result<u64> {
  u64::try_from(value).map_err(|_| Error::IntegerRange(value.to_string()))
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// A `genesis` row exactly as stored.
#[derive(Debug, Clone)]
pub struct RawGenesis {
  pub deployer:    String,
  pub config_json: String,
  pub hash:        String,
}

impl RawGenesis {
  pub fn decode_config(&self) -> Result<LedgerConfig> {
    Ok(serde_json::from_str(&self.config_json)?)
  }
}

/// A `journal` row exactly as stored. Hashes are always recomputed from these
/// strings, never from re-serialised domain values.
#[derive(Debug, Clone)]
pub struct RawJournalEntry {
  pub seq:          i64,
  pub caller:       String,
  pub at:           i64,
  pub operation:    String,
  pub command_json: String,
  pub prev_hash:    String,
  pub entry_hash:   String,
}

pub const JOURNAL_COLUMNS: &str =
  "seq, caller, at, operation, command_json, prev_hash, entry_hash";

impl RawJournalEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      seq:          row.get(0)?,
      caller:       row.get(1)?,
      at:           row.get(2)?,
      operation:    row.get(3)?,
      command_json: row.get(4)?,
      prev_hash:    row.get(5)?,
      entry_hash:   row.get(6)?,
    })
  }

  pub fn decode(self) -> Result<JournalEntry> {
    let command: Command = serde_json::from_str(&self.command_json)?;
    Ok(JournalEntry {
      seq: decode_u64(self.seq)?,
      caller: Principal::new(self.caller),
      at: Timestamp::from_secs(decode_u64(self.at)?),
      command,
      prev_hash: self.prev_hash,
      entry_hash: self.entry_hash,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn u64_beyond_i64_is_rejected() {
    assert!(matches!(encode_u64(u64::MAX), Err(Error::IntegerRange(_))));
    assert_eq!(encode_u64(42).unwrap(), 42);
  }

  #[test]
  fn negative_integers_do_not_decode() {
    assert!(matches!(decode_u64(-1), Err(Error::IntegerRange(_))));
    assert_eq!(decode_u64(7).unwrap(), 7);
  }
}
