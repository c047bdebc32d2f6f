//! The `LedgerStore` trait — the seam between the ledger and its hosting
//! storage.
//!
//! The trait is implemented by [`MemoryStore`](crate::memory::MemoryStore) and
//! by storage backends (e.g. `weft-store-sqlite`). Higher layers (`weft-api`,
//! `weft-server`) depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  AsLedgerError,
  certification::{Certification, Product, Standard},
  command::{Command, Outcome},
  consumer::{ConsumerScan, FeedbackSummary, ProductFeedback, ProductVerification},
  kind::RegistryKind,
  ledger::{Ledger, ProductTrace},
  lifecycle::CertificationStatus,
  material::{Batch, Material},
  primitives::{Clock, Context, EntityId, Principal, Record, Timestamp},
  processing::{BatchProcessing, ProcessingStep},
};

/// Abstraction over a hosted ledger.
///
/// Writes are serialised: each `commit` runs to completion, validated and
/// committed (or rejected with no effect), before the next begins. Reads see
/// only committed state and never consult access control.
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + AsLedgerError + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate and commit `command` as `caller`.
  ///
  /// `clock` is read only once this write holds the store's write lock, so
  /// commit times never run backwards against commit order.
  fn commit<C: Clock + 'static>(
    &self,
    caller: Principal,
    clock: C,
    command: Command,
  ) -> impl Future<Output = Result<Outcome, Self::Error>> + Send + '_;

  /// Validate and commit `command` under a fixed `ctx`.
  fn execute(
    &self,
    ctx: Context,
    command: Command,
  ) -> impl Future<Output = Result<Outcome, Self::Error>> + Send + '_ {
    self.commit(ctx.caller, ctx.now, command)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Run `f` against a consistent snapshot of committed state.
  fn view<R, F>(&self, f: F) -> impl Future<Output = R> + Send + '_
  where
    F: FnOnce(&Ledger) -> R + Send + 'static,
    R: Send + 'static;

  fn contract_owner(
    &self,
    registry: RegistryKind,
  ) -> impl Future<Output = Principal> + Send + '_ {
    self.view(move |l| l.contract_owner(registry).clone())
  }

  fn last_commit(&self) -> impl Future<Output = Option<Timestamp>> + Send + '_ {
    self.view(|l| l.last_commit())
  }

  // Material sourcing

  fn get_material(&self, id: EntityId) -> impl Future<Output = Option<Material>> + Send + '_ {
    self.view(move |l| l.materials().get_material(id).cloned())
  }

  fn get_batch(&self, id: EntityId) -> impl Future<Output = Option<Batch>> + Send + '_ {
    self.view(move |l| l.materials().get_batch(id).cloned())
  }

  fn batches_of_material(
    &self,
    material_id: EntityId,
  ) -> impl Future<Output = Vec<Record<Batch>>> + Send + '_ {
    self.view(move |l| l.materials().batches_of_material(material_id))
  }

  // Processing verification

  fn get_processing_step(
    &self,
    id: EntityId,
  ) -> impl Future<Output = Option<ProcessingStep>> + Send + '_ {
    self.view(move |l| l.processing().get_processing_step(id).cloned())
  }

  fn get_batch_processing(
    &self,
    id: EntityId,
  ) -> impl Future<Output = Option<BatchProcessing>> + Send + '_ {
    self.view(move |l| l.processing().get_batch_processing(id).cloned())
  }

  fn processing_history(
    &self,
    batch_id: EntityId,
  ) -> impl Future<Output = Vec<Record<BatchProcessing>>> + Send + '_ {
    self.view(move |l| l.processing().processing_history(batch_id))
  }

  // Certification

  fn get_standard(&self, id: EntityId) -> impl Future<Output = Option<Standard>> + Send + '_ {
    self.view(move |l| l.certification().get_standard(id).cloned())
  }

  fn get_product(&self, id: EntityId) -> impl Future<Output = Option<Product>> + Send + '_ {
    self.view(move |l| l.certification().get_product(id).cloned())
  }

  fn get_certification(
    &self,
    id: EntityId,
  ) -> impl Future<Output = Option<Certification>> + Send + '_ {
    self.view(move |l| l.certification().get_certification(id).cloned())
  }

  fn certification_status(
    &self,
    id: EntityId,
    at: Timestamp,
  ) -> impl Future<Output = Option<CertificationStatus>> + Send + '_ {
    self.view(move |l| l.certification().certification_status(id, at))
  }

  fn certifications_for_product(
    &self,
    product_id: EntityId,
  ) -> impl Future<Output = Vec<Record<Certification>>> + Send + '_ {
    self.view(move |l| l.certification().certifications_for_product(product_id))
  }

  // Consumer verification

  fn get_product_verification(
    &self,
    id: EntityId,
  ) -> impl Future<Output = Option<ProductVerification>> + Send + '_ {
    self.view(move |l| l.consumer().get_product_verification(id).cloned())
  }

  fn get_consumer_scan(
    &self,
    id: EntityId,
  ) -> impl Future<Output = Option<ConsumerScan>> + Send + '_ {
    self.view(move |l| l.consumer().get_consumer_scan(id).cloned())
  }

  fn get_product_feedback(
    &self,
    id: EntityId,
  ) -> impl Future<Output = Option<ProductFeedback>> + Send + '_ {
    self.view(move |l| l.consumer().get_product_feedback(id).cloned())
  }

  fn verifications_for_product(
    &self,
    product_id: EntityId,
  ) -> impl Future<Output = Vec<Record<ProductVerification>>> + Send + '_ {
    self.view(move |l| l.consumer().verifications_for_product(product_id))
  }

  fn scans_for_verification(
    &self,
    verification_id: EntityId,
  ) -> impl Future<Output = Vec<Record<ConsumerScan>>> + Send + '_ {
    self.view(move |l| l.consumer().scans_for_verification(verification_id))
  }

  fn feedback_for_product(
    &self,
    product_id: EntityId,
  ) -> impl Future<Output = Vec<Record<ProductFeedback>>> + Send + '_ {
    self.view(move |l| l.consumer().feedback_for_product(product_id))
  }

  fn feedback_summary(
    &self,
    product_id: EntityId,
  ) -> impl Future<Output = FeedbackSummary> + Send + '_ {
    self.view(move |l| l.consumer().feedback_summary(product_id))
  }

  // Cross-registry

  /// Materialise a [`ProductTrace`]. Returns `None` if the product does not
  /// exist.
  fn trace_product(
    &self,
    product_id: EntityId,
    at: Timestamp,
  ) -> impl Future<Output = Option<ProductTrace>> + Send + '_ {
    self.view(move |l| l.trace_product(product_id, at))
  }
}
