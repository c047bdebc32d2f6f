//! The write vocabulary: every mutation the ledger accepts, as data.
//!
//! Commands are what storage backends journal and replay, so their serialised
//! form is stable: internally tagged by `op`, using the [`Operation`] name.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
  access::Operation,
  certification::{NewCertification, NewProduct, NewStandard},
  consumer::{NewConsumerScan, NewProductFeedback, NewProductVerification},
  kind::RegistryKind,
  lifecycle::Transition,
  material::{NewBatch, NewMaterial},
  primitives::{EntityId, Principal},
  processing::{NewBatchProcessing, NewProcessingStep},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
  SetContractOwner { registry: RegistryKind, new_owner: Principal },

  RegisterMaterial(NewMaterial),
  RegisterBatch(NewBatch),

  RegisterProcessingStep(NewProcessingStep),
  RecordBatchProcessing(NewBatchProcessing),
  VerifyBatchProcessing { record_id: EntityId },

  RegisterStandard(NewStandard),
  RegisterProduct(NewProduct),
  AppendProductBatches { product_id: EntityId, batch_ids: BTreeSet<EntityId> },
  IssueCertification(NewCertification),
  RevokeCertification { certification_id: EntityId },

  CreateProductVerification(NewProductVerification),
  RecordConsumerScan(NewConsumerScan),
  SubmitProductFeedback(NewProductFeedback),
}

impl Command {
  pub fn operation(&self) -> Operation {
    match self {
      Self::SetContractOwner { .. } => Operation::SetContractOwner,
      Self::RegisterMaterial(_) => Operation::RegisterMaterial,
      Self::RegisterBatch(_) => Operation::RegisterBatch,
      Self::RegisterProcessingStep(_) => Operation::RegisterProcessingStep,
      Self::RecordBatchProcessing(_) => Operation::RecordBatchProcessing,
      Self::VerifyBatchProcessing { .. } => Operation::VerifyBatchProcessing,
      Self::RegisterStandard(_) => Operation::RegisterStandard,
      Self::RegisterProduct(_) => Operation::RegisterProduct,
      Self::AppendProductBatches { .. } => Operation::AppendProductBatches,
      Self::IssueCertification(_) => Operation::IssueCertification,
      Self::RevokeCertification { .. } => Operation::RevokeCertification,
      Self::CreateProductVerification(_) => Operation::CreateProductVerification,
      Self::RecordConsumerScan(_) => Operation::RecordConsumerScan,
      Self::SubmitProductFeedback(_) => Operation::SubmitProductFeedback,
    }
  }

  /// The registry whose state this command changes.
  pub fn registry(&self) -> RegistryKind {
    match self {
      Self::SetContractOwner { registry, .. } => *registry,
      Self::RegisterMaterial(_) | Self::RegisterBatch(_) => RegistryKind::MaterialSourcing,
      Self::RegisterProcessingStep(_)
      | Self::RecordBatchProcessing(_)
      | Self::VerifyBatchProcessing { .. } => RegistryKind::ProcessingVerification,
      Self::RegisterStandard(_)
      | Self::RegisterProduct(_)
      | Self::AppendProductBatches { .. }
      | Self::IssueCertification(_)
      | Self::RevokeCertification { .. } => RegistryKind::Certification,
      Self::CreateProductVerification(_)
      | Self::RecordConsumerScan(_)
      | Self::SubmitProductFeedback(_) => RegistryKind::ConsumerVerification,
    }
  }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
  Created { id: EntityId },
  Transitioned { transition: Transition },
  /// `added` counts batch ids that were not already on the product.
  BatchesAppended { added: usize },
  OwnerChanged { owner: Principal },
}

impl Outcome {
  pub fn created_id(&self) -> Option<EntityId> {
    match self {
      Self::Created { id } => Some(*id),
      _ => None,
    }
  }
}
