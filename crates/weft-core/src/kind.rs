//! Discriminants for registries and the entity stores they own.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// One of the four independently-owned registries.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
  Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RegistryKind {
  MaterialSourcing,
  ProcessingVerification,
  Certification,
  ConsumerVerification,
}

/// Every entity store; each has its own identifier counter.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
  Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Material,
  Batch,
  ProcessingStep,
  BatchProcessing,
  Standard,
  Product,
  Certification,
  ProductVerification,
  ConsumerScan,
  ProductFeedback,
}

impl EntityKind {
  /// The registry whose arena holds this kind.
  pub fn registry(self) -> RegistryKind {
    match self {
      Self::Material | Self::Batch => RegistryKind::MaterialSourcing,
      Self::ProcessingStep | Self::BatchProcessing => {
        RegistryKind::ProcessingVerification
      }
      Self::Standard | Self::Product | Self::Certification => {
        RegistryKind::Certification
      }
      Self::ProductVerification | Self::ConsumerScan | Self::ProductFeedback => {
        RegistryKind::ConsumerVerification
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn registry_kind_parses_its_display_form() {
    for kind in RegistryKind::iter() {
      assert_eq!(RegistryKind::from_str(&kind.to_string()).unwrap(), kind);
    }
  }

  #[test]
  fn every_registry_owns_some_entity_kind() {
    for registry in RegistryKind::iter() {
      assert!(EntityKind::iter().any(|k| k.registry() == registry));
    }
  }
}
