//! Owner-gated write access and the per-operation policy table.
//!
//! Each registry carries its own [`AccessControl`]: a single mutable owner
//! (initially the deployer) plus a copy of the [`AccessPolicy`] deciding which
//! operations need that owner. Reads never consult either.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{Error, Result, kind::RegistryKind, primitives::Principal};

// ─── Operations ──────────────────────────────────────────────────────────────

/// Every mutating operation exposed by the four registries.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
  Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
  SetContractOwner,
  RegisterMaterial,
  RegisterBatch,
  RegisterProcessingStep,
  RecordBatchProcessing,
  VerifyBatchProcessing,
  RegisterStandard,
  RegisterProduct,
  AppendProductBatches,
  IssueCertification,
  RevokeCertification,
  CreateProductVerification,
  RecordConsumerScan,
  SubmitProductFeedback,
}

impl Operation {
  /// Registrations and issuance are owner-only; recording, scanning and
  /// feedback are open to any principal.
  pub fn default_gate(self) -> Gate {
    match self {
      Self::RecordBatchProcessing
      | Self::RecordConsumerScan
      | Self::SubmitProductFeedback => Gate::Open,
      _ => Gate::Owner,
    }
  }

  /// The registry that executes this operation. `SetContractOwner` is
  /// addressed to a registry explicitly, so it has none.
  pub fn registry(self) -> Option<RegistryKind> {
    match self {
      Self::SetContractOwner => None,
      Self::RegisterMaterial | Self::RegisterBatch => {
        Some(RegistryKind::MaterialSourcing)
      }
      Self::RegisterProcessingStep
      | Self::RecordBatchProcessing
      | Self::VerifyBatchProcessing => Some(RegistryKind::ProcessingVerification),
      Self::RegisterStandard
      | Self::RegisterProduct
      | Self::AppendProductBatches
      | Self::IssueCertification
      | Self::RevokeCertification => Some(RegistryKind::Certification),
      Self::CreateProductVerification
      | Self::RecordConsumerScan
      | Self::SubmitProductFeedback => Some(RegistryKind::ConsumerVerification),
    }
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Who may invoke an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gate {
  /// Only the registry's current owner.
  Owner,
  /// Any principal.
  Open,
}

/// Per-operation overrides on top of [`Operation::default_gate`].
///
/// Deserialises from a plain map, e.g. `{ "register_batch": "open" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessPolicy {
  overrides: BTreeMap<Operation, Gate>,
}

impl AccessPolicy {
  pub fn with(mut self, operation: Operation, gate: Gate) -> Self {
    self.overrides.insert(operation, gate);
    self
  }

  /// Owner transfer is always owner-gated, whatever the table says.
  pub fn gate(&self, operation: Operation) -> Gate {
    if operation == Operation::SetContractOwner {
      return Gate::Owner;
    }
    self
      .overrides
      .get(&operation)
      .copied()
      .unwrap_or_else(|| operation.default_gate())
  }
}

// ─── Access control ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
  owner:  Principal,
  policy: AccessPolicy,
}

impl AccessControl {
  pub fn new(owner: Principal, policy: AccessPolicy) -> Self { Self { owner, policy } }

  pub fn owner(&self) -> &Principal { &self.owner }

  pub fn policy(&self) -> &AccessPolicy { &self.policy }

  /// Check `caller` against the gate the policy assigns to `operation`.
  pub fn authorize(&self, caller: &Principal, operation: Operation) -> Result<()> {
    match self.policy.gate(operation) {
      Gate::Open => Ok(()),
      Gate::Owner => self.require_owner(caller, operation),
    }
  }

  pub fn require_owner(&self, caller: &Principal, operation: Operation) -> Result<()> {
    if *caller == self.owner {
      return Ok(());
    }
    tracing::debug!(%caller, %operation, owner = %self.owner, "owner check failed");
    Err(Error::Unauthorized { caller: caller.clone(), operation })
  }

  pub fn set_owner(&mut self, caller: &Principal, new_owner: Principal) -> Result<()> {
    self.require_owner(caller, Operation::SetContractOwner)?;
    self.owner = new_owner;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  fn alice() -> Principal { Principal::new("alice") }
  fn mallory() -> Principal { Principal::new("mallory") }

  #[test]
  fn only_owner_may_transfer() {
    let mut access = AccessControl::new(alice(), AccessPolicy::default());

    let err = access.set_owner(&mallory(), mallory()).unwrap_err();
    assert!(matches!(err, Error::Unauthorized { .. }));
    assert_eq!(access.owner(), &alice());

    access.set_owner(&alice(), mallory()).unwrap();
    assert_eq!(access.owner(), &mallory());
    assert!(access.require_owner(&alice(), Operation::RegisterMaterial).is_err());
  }

  #[test]
  fn open_operations_admit_anyone() {
    let access = AccessControl::new(alice(), AccessPolicy::default());
    access.authorize(&mallory(), Operation::RecordConsumerScan).unwrap();
    access.authorize(&mallory(), Operation::SubmitProductFeedback).unwrap();
    assert!(access.authorize(&mallory(), Operation::IssueCertification).is_err());
  }

  #[test]
  fn overrides_replace_defaults() {
    let policy = AccessPolicy::default()
      .with(Operation::RegisterBatch, Gate::Open)
      .with(Operation::RecordConsumerScan, Gate::Owner);
    let access = AccessControl::new(alice(), policy);

    access.authorize(&mallory(), Operation::RegisterBatch).unwrap();
    assert!(access.authorize(&mallory(), Operation::RecordConsumerScan).is_err());
  }

  #[test]
  fn owner_transfer_cannot_be_opened() {
    let policy = AccessPolicy::default().with(Operation::SetContractOwner, Gate::Open);
    assert_eq!(policy.gate(Operation::SetContractOwner), Gate::Owner);
  }

  #[test]
  fn policy_deserialises_from_a_map() {
    let policy: AccessPolicy =
      serde_json::from_str(r#"{ "register_batch": "open" }"#).unwrap();
    assert_eq!(policy.gate(Operation::RegisterBatch), Gate::Open);
    assert_eq!(policy.gate(Operation::RegisterMaterial), Gate::Owner);
  }

  #[test]
  fn every_operation_but_owner_transfer_has_a_registry() {
    for op in Operation::iter() {
      assert_eq!(op.registry().is_none(), op == Operation::SetContractOwner);
    }
  }
}
