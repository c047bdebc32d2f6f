//! Processing verification — reusable step definitions, and records of a
//! batch passing through a step, later verified by the registry owner.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  access::{AccessControl, AccessPolicy, Operation},
  arena::Arena,
  directory::BatchDirectory,
  error::Error,
  kind::EntityKind,
  lifecycle::Transition,
  primitives::{Context, EntityId, Principal, Record, Timestamp},
};

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStep {
  pub name:              String,
  pub description:       String,
  pub eco_friendly:      bool,
  /// Litres per unit processed.
  pub water_usage:       u64,
  /// kWh per unit processed.
  pub energy_usage:      u64,
  pub chemicals_used:    Vec<String>,
  pub registered_by:     Principal,
  pub registration_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProcessingStep {
  pub name:           String,
  pub description:    String,
  pub eco_friendly:   bool,
  pub water_usage:    u64,
  pub energy_usage:   u64,
  #[serde(default)]
  pub chemicals_used: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProcessing {
  pub batch_id:  EntityId,
  pub step_id:   EntityId,
  pub processor: Principal,
  pub location:  String,
  pub timestamp: Timestamp,
  pub verified:  bool,
  /// Set once, by the first successful verification.
  pub verifier:  Option<Principal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatchProcessing {
  pub batch_id:  EntityId,
  pub step_id:   EntityId,
  pub processor: Principal,
  pub location:  String,
}

// ─── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ProcessingVerificationRegistry {
  access:  AccessControl,
  steps:   Arena<ProcessingStep>,
  records: Arena<BatchProcessing>,
}

impl ProcessingVerificationRegistry {
  pub fn new(owner: Principal, policy: AccessPolicy) -> Self {
    Self {
      access:  AccessControl::new(owner, policy),
      steps:   Arena::new(EntityKind::ProcessingStep),
      records: Arena::new(EntityKind::BatchProcessing),
    }
  }

  pub fn access(&self) -> &AccessControl { &self.access }

  pub fn set_contract_owner(&mut self, ctx: &Context, new_owner: Principal) -> Result<()> {
    self.access.set_owner(&ctx.caller, new_owner)
  }

  pub fn register_processing_step(
    &mut self,
    ctx: &Context,
    input: NewProcessingStep,
  ) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::RegisterProcessingStep)?;

    self.steps.insert(ProcessingStep {
      name:              input.name,
      description:       input.description,
      eco_friendly:      input.eco_friendly,
      water_usage:       input.water_usage,
      energy_usage:      input.energy_usage,
      chemicals_used:    input.chemicals_used,
      registered_by:     ctx.caller.clone(),
      registration_date: ctx.now,
    })
  }

  /// Record that a batch went through a step. The batch is resolved through
  /// `batches`, the step locally.
  pub fn record_batch_processing(
    &mut self,
    ctx: &Context,
    batches: &impl BatchDirectory,
    input: NewBatchProcessing,
  ) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::RecordBatchProcessing)?;
    if !batches.batch_exists(input.batch_id) {
      return Err(Error::not_found(EntityKind::Batch, input.batch_id));
    }
    self.steps.require(input.step_id)?;

    self.records.insert(BatchProcessing {
      batch_id:  input.batch_id,
      step_id:   input.step_id,
      processor: input.processor,
      location:  input.location,
      timestamp: ctx.now,
      verified:  false,
      verifier:  None,
    })
  }

  /// Mark a record verified by the caller. Verification is monotone: once a
  /// record is verified its verifier is fixed and replays change nothing.
  pub fn verify_batch_processing(
    &mut self,
    ctx: &Context,
    record_id: EntityId,
  ) -> Result<Transition> {
    self.access.authorize(&ctx.caller, Operation::VerifyBatchProcessing)?;
    let record = self.records.require_mut(record_id)?;

    let transition = Transition::flip(&mut record.verified, false);
    if transition.was_applied() {
      record.verifier = Some(ctx.caller.clone());
    }
    Ok(transition)
  }

  pub fn get_processing_step(&self, id: EntityId) -> Option<&ProcessingStep> {
    self.steps.get(id)
  }

  pub fn get_batch_processing(&self, id: EntityId) -> Option<&BatchProcessing> {
    self.records.get(id)
  }

  /// Every processing record for `batch_id`, oldest first.
  pub fn processing_history(&self, batch_id: EntityId) -> Vec<Record<BatchProcessing>> {
    self.records.select(|r| r.batch_id == batch_id)
  }

  pub fn step_count(&self) -> usize { self.steps.len() }

  pub fn record_count(&self) -> usize { self.records.len() }
}
