//! One-way lifecycle flips and computed status.
//!
//! Entities are immutable once created. The only state that ever changes is a
//! single boolean per lifecycle-bearing entity (`BatchProcessing::verified`,
//! `Certification::active`), and it moves in one direction. Replaying the flip
//! is a no-op, not an error.

use serde::{Deserialize, Serialize};

/// Result of requesting a one-way flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
  /// The entity moved to its terminal state.
  Applied,
  /// The entity was already there; nothing changed.
  AlreadyApplied,
}

impl Transition {
  pub fn was_applied(self) -> bool { matches!(self, Self::Applied) }

  /// Flip `flag` from `from` to `!from`, or report it already flipped.
  pub(crate) fn flip(flag: &mut bool, from: bool) -> Self {
    if *flag == from {
      *flag = !from;
      Self::Applied
    } else {
      Self::AlreadyApplied
    }
  }
}

/// The status of a certification, computed at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationStatus {
  Active,
  /// Never revoked, but its expiry date has passed.
  Expired,
  Revoked,
}

impl CertificationStatus {
  pub fn is_valid(self) -> bool { matches!(self, Self::Active) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flip_is_one_way() {
    let mut verified = false;
    assert_eq!(Transition::flip(&mut verified, false), Transition::Applied);
    assert!(verified);
    assert_eq!(Transition::flip(&mut verified, false), Transition::AlreadyApplied);
    assert!(verified);
  }
}
