//! [`Ledger`] — the four registries composed, with cross-registry
//! dependencies wired and every mutation funnelled through [`Ledger::apply`].

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  access::AccessPolicy,
  certification::{Certification, CertificationRegistry, Product},
  command::{Command, Outcome},
  consumer::{ConsumerVerificationRegistry, ProductIntegrity, ProductVerification},
  kind::RegistryKind,
  lifecycle::CertificationStatus,
  material::{Batch, Material, MaterialSourcingRegistry},
  primitives::{Context, EntityId, Principal, Record, Timestamp},
  processing::{BatchProcessing, ProcessingVerificationRegistry},
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Deployment-time policy shared by all four registries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
  pub policy:            AccessPolicy,
  pub product_integrity: ProductIntegrity,
}

// ─── Trace read model ────────────────────────────────────────────────────────

/// One batch of a product, resolved back to its raw material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchTrace {
  pub batch_id:   EntityId,
  pub batch:      Batch,
  pub material:   Option<Record<Material>>,
  pub processing: Vec<Record<BatchProcessing>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationView {
  #[serde(flatten)]
  pub record: Record<Certification>,
  pub status: CertificationStatus,
}

/// A product's lineage from raw material to consumer-facing verification —
/// never stored, always derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTrace {
  pub product:        Record<Product>,
  /// The point in time certification status was computed for.
  pub as_of:          Timestamp,
  pub batches:        Vec<BatchTrace>,
  pub certifications: Vec<CertificationView>,
  pub verifications:  Vec<Record<ProductVerification>>,
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Ledger {
  materials:     MaterialSourcingRegistry,
  processing:    ProcessingVerificationRegistry,
  certification: CertificationRegistry,
  consumer:      ConsumerVerificationRegistry,
  last_commit:   Option<Timestamp>,
}

impl Ledger {
  /// Deploy all four registries, each initially owned by `deployer`.
  pub fn deploy(deployer: &Principal, config: &LedgerConfig) -> Self {
    Self {
      materials:     MaterialSourcingRegistry::new(deployer.clone(), config.policy.clone()),
      processing:    ProcessingVerificationRegistry::new(
        deployer.clone(),
        config.policy.clone(),
      ),
      certification: CertificationRegistry::new(deployer.clone(), config.policy.clone()),
      consumer:      ConsumerVerificationRegistry::new(
        deployer.clone(),
        config.policy.clone(),
        config.product_integrity,
      ),
      last_commit:   None,
    }
  }

  pub fn materials(&self) -> &MaterialSourcingRegistry { &self.materials }

  pub fn processing(&self) -> &ProcessingVerificationRegistry { &self.processing }

  pub fn certification(&self) -> &CertificationRegistry { &self.certification }

  pub fn consumer(&self) -> &ConsumerVerificationRegistry { &self.consumer }

  /// Time of the most recent successful command.
  pub fn last_commit(&self) -> Option<Timestamp> { self.last_commit }

  pub fn contract_owner(&self, registry: RegistryKind) -> &Principal {
    match registry {
      RegistryKind::MaterialSourcing => self.materials.access().owner(),
      RegistryKind::ProcessingVerification => self.processing.access().owner(),
      RegistryKind::Certification => self.certification.access().owner(),
      RegistryKind::ConsumerVerification => self.consumer.access().owner(),
    }
  }

  /// Validate and commit one command. On error nothing has changed.
  pub fn apply(&mut self, ctx: &Context, command: Command) -> Result<Outcome> {
    if let Some(last) = self.last_commit
      && ctx.now < last
    {
      return Err(Error::ClockRegression { now: ctx.now, last });
    }

    let operation = command.operation();
    let outcome = self.dispatch(ctx, command);
    match &outcome {
      Ok(outcome) => {
        self.last_commit = Some(ctx.now);
        tracing::debug!(caller = %ctx.caller, %operation, ?outcome, "command applied");
      }
      Err(error) => {
        tracing::debug!(caller = %ctx.caller, %operation, %error, "command rejected");
      }
    }
    outcome
  }

  fn dispatch(&mut self, ctx: &Context, command: Command) -> Result<Outcome> {
    let created = |id| Outcome::Created { id };
    let transitioned = |transition| Outcome::Transitioned { transition };

    match command {
      Command::SetContractOwner { registry, new_owner } => {
        match registry {
          RegistryKind::MaterialSourcing => {
            self.materials.set_contract_owner(ctx, new_owner.clone())
          }
          RegistryKind::ProcessingVerification => {
            self.processing.set_contract_owner(ctx, new_owner.clone())
          }
          RegistryKind::Certification => {
            self.certification.set_contract_owner(ctx, new_owner.clone())
          }
          RegistryKind::ConsumerVerification => {
            self.consumer.set_contract_owner(ctx, new_owner.clone())
          }
        }?;
        Ok(Outcome::OwnerChanged { owner: new_owner })
      }

      Command::RegisterMaterial(input) => {
        self.materials.register_material(ctx, input).map(created)
      }
      Command::RegisterBatch(input) => self.materials.register_batch(ctx, input).map(created),

      Command::RegisterProcessingStep(input) => {
        self.processing.register_processing_step(ctx, input).map(created)
      }
      Command::RecordBatchProcessing(input) => self
        .processing
        .record_batch_processing(ctx, &self.materials, input)
        .map(created),
      Command::VerifyBatchProcessing { record_id } => self
        .processing
        .verify_batch_processing(ctx, record_id)
        .map(transitioned),

      Command::RegisterStandard(input) => {
        self.certification.register_standard(ctx, input).map(created)
      }
      Command::RegisterProduct(input) => self
        .certification
        .register_product(ctx, &self.materials, input)
        .map(created),
      Command::AppendProductBatches { product_id, batch_ids } => self
        .certification
        .append_product_batches(ctx, &self.materials, product_id, batch_ids)
        .map(|added| Outcome::BatchesAppended { added }),
      Command::IssueCertification(input) => {
        self.certification.issue_certification(ctx, input).map(created)
      }
      Command::RevokeCertification { certification_id } => self
        .certification
        .revoke_certification(ctx, certification_id)
        .map(transitioned),

      Command::CreateProductVerification(input) => self
        .consumer
        .create_product_verification(ctx, &self.certification, input)
        .map(created),
      Command::RecordConsumerScan(input) => {
        self.consumer.record_consumer_scan(ctx, input).map(created)
      }
      Command::SubmitProductFeedback(input) => self
        .consumer
        .submit_product_feedback(ctx, &self.certification, input)
        .map(created),
    }
  }

  /// Assemble the lineage of `product_id`, computing certification status
  /// as of `at`. Returns `None` if the product does not exist.
  pub fn trace_product(&self, product_id: EntityId, at: Timestamp) -> Option<ProductTrace> {
    let product = self.certification.get_product(product_id)?.clone();

    let batches = product
      .batch_ids
      .iter()
      .filter_map(|&batch_id| {
        let batch = self.materials.get_batch(batch_id)?.clone();
        let material = self
          .materials
          .get_material(batch.material_id)
          .map(|m| Record::new(batch.material_id, m.clone()));
        Some(BatchTrace {
          batch_id,
          material,
          processing: self.processing.processing_history(batch_id),
          batch,
        })
      })
      .collect();

    let certifications = self
      .certification
      .certifications_for_product(product_id)
      .into_iter()
      .map(|record| {
        let status = record.entity.status_at(at);
        CertificationView { record, status }
      })
      .collect();

    Some(ProductTrace {
      product: Record::new(product_id, product),
      as_of: at,
      batches,
      certifications,
      verifications: self.consumer.verifications_for_product(product_id),
    })
  }
}
