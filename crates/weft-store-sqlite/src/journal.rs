//! The hash-chained command journal.
//!
//! Entry `n` commits to its own fields and to the hash of entry `n - 1`; the
//! first entry chains from the genesis hash. Each field is length-prefixed
//! before hashing so that no two distinct rows share a preimage.

use serde::Serialize;
use sha2::{Digest, Sha256};
use weft_core::{
  command::Command,
  primitives::{Principal, Timestamp},
};

use crate::{Error, Result, encode::RawJournalEntry};

const GENESIS_DOMAIN: &[u8] = b"weft_genesis_v1:";
const ENTRY_DOMAIN: &[u8] = b"weft_journal_v1:";

/// A decoded journal entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
  pub seq:        u64,
  pub caller:     Principal,
  pub at:         Timestamp,
  pub command:    Command,
  pub prev_hash:  String,
  pub entry_hash: String,
}

/// The tip of the chain: the last committed sequence number and its hash.
/// `seq == 0` means the journal is empty and `hash` is the genesis hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainHead {
  pub seq:  u64,
  pub hash: String,
}

/// Result of a full chain verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalReport {
  pub entries:      u64,
  pub genesis_hash: String,
  pub head:         ChainHead,
}

fn update_field(hasher: &mut Sha256, field: &[u8]) {
  hasher.update((field.len() as u64).to_le_bytes());
  hasher.update(field);
}

pub fn genesis_hash(deployer: &str, config_json: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(GENESIS_DOMAIN);
  update_field(&mut hasher, deployer.as_bytes());
  update_field(&mut hasher, config_json.as_bytes());
  hex::encode(hasher.finalize())
}

pub fn entry_hash(
  seq: u64,
  caller: &str,
  at: u64,
  operation: &str,
  command_json: &str,
  prev_hash: &str,
) -> String {
  let mut hasher = Sha256::new();
  hasher.update(ENTRY_DOMAIN);
  update_field(&mut hasher, &seq.to_le_bytes());
  update_field(&mut hasher, caller.as_bytes());
  update_field(&mut hasher, &at.to_le_bytes());
  update_field(&mut hasher, operation.as_bytes());
  update_field(&mut hasher, command_json.as_bytes());
  update_field(&mut hasher, prev_hash.as_bytes());
  hex::encode(hasher.finalize())
}

impl ChainHead {
  pub fn genesis(hash: String) -> Self { Self { seq: 0, hash } }

  /// Check that `raw` is the direct successor of this head and return the
  /// advanced head.
  pub(crate) fn advance(&self, raw: &RawJournalEntry) -> Result<ChainHead> {
    let seq = self.seq + 1;
    let tampered = Error::TamperDetected { seq };

    if u64::try_from(raw.seq).ok() != Some(seq) || raw.prev_hash != self.hash {
      return Err(tampered);
    }
    let at = u64::try_from(raw.at).map_err(|_| Error::TamperDetected { seq })?;
    let expected = entry_hash(
      seq,
      &raw.caller,
      at,
      &raw.operation,
      &raw.command_json,
      &raw.prev_hash,
    );
    if expected != raw.entry_hash {
      return Err(tampered);
    }
    Ok(ChainHead { seq, hash: expected })
  }
}
