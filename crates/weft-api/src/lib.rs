//! JSON REST API for weft.
//!
//! Exposes an axum [`Router`] backed by any [`weft_core::store::LedgerStore`].
//! Authentication is the host's responsibility: it must place the caller's
//! [`Principal`](weft_core::primitives::Principal) in the request extensions
//! before a mutating request reaches these handlers.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(weft_api::api_router(ApiState::new(store.clone(), clock)))
//! ```

pub mod body;
pub mod caller;
pub mod certification;
pub mod consumer;
pub mod error;
pub mod materials;
pub mod owners;
pub mod processing;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use weft_core::{
  command::{Command, Outcome},
  primitives::{Clock, Principal},
  store::LedgerStore,
};

pub use body::JsonBody;
pub use caller::Caller;
pub use error::ApiError;

/// Shared handler state: the hosted ledger and the clock that stamps each
/// command's execution context.
pub struct ApiState<S> {
  pub store: Arc<S>,
  pub clock: Arc<dyn Clock>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self { Self { store, clock } }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), clock: Arc::clone(&self.clock) }
  }
}

impl<S: LedgerStore> ApiState<S> {
  /// Execute `command` as `caller`, stamped by the clock once the store has
  /// serialised the write.
  pub(crate) async fn execute(
    &self,
    caller: Principal,
    command: Command,
  ) -> Result<Outcome, ApiError> {
    self
      .store
      .commit(caller, Arc::clone(&self.clock), command)
      .await
      .map_err(ApiError::from_store)
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: LedgerStore + 'static,
{
  Router::new()
    // Material sourcing
    .route("/materials", post(materials::register_material::<S>))
    .route("/materials/{id}", get(materials::get_material::<S>))
    .route("/materials/{id}/batches", get(materials::batches_of_material::<S>))
    .route("/batches", post(materials::register_batch::<S>))
    .route("/batches/{id}", get(materials::get_batch::<S>))
    .route("/batches/{id}/processing", get(processing::processing_history::<S>))
    // Processing verification
    .route("/processing-steps", post(processing::register_step::<S>))
    .route("/processing-steps/{id}", get(processing::get_step::<S>))
    .route("/batch-processing", post(processing::record::<S>))
    .route("/batch-processing/{id}", get(processing::get_record::<S>))
    .route("/batch-processing/{id}/verify", post(processing::verify::<S>))
    // Certification
    .route("/standards", post(certification::register_standard::<S>))
    .route("/standards/{id}", get(certification::get_standard::<S>))
    .route("/products", post(certification::register_product::<S>))
    .route("/products/{id}", get(certification::get_product::<S>))
    .route("/products/{id}/batches", post(certification::append_batches::<S>))
    .route(
      "/products/{id}/certifications",
      get(certification::certifications_for_product::<S>),
    )
    .route("/products/{id}/trace", get(certification::trace::<S>))
    .route("/certifications", post(certification::issue::<S>))
    .route("/certifications/{id}", get(certification::get_certification::<S>))
    .route("/certifications/{id}/revoke", post(certification::revoke::<S>))
    // Consumer verification
    .route("/products/{id}/verifications", get(consumer::verifications_for_product::<S>))
    .route("/products/{id}/feedback", get(consumer::feedback_for_product::<S>))
    .route("/verifications", post(consumer::create_verification::<S>))
    .route("/verifications/{id}", get(consumer::get_verification::<S>))
    .route(
      "/verifications/{id}/scans",
      get(consumer::scans_for_verification::<S>).post(consumer::record_scan::<S>),
    )
    .route("/scans/{id}", get(consumer::get_scan::<S>))
    .route("/feedback", post(consumer::submit_feedback::<S>))
    .route("/feedback/{id}", get(consumer::get_feedback::<S>))
    // Ownership
    .route(
      "/registries/{registry}/owner",
      get(owners::get_owner::<S>).put(owners::set_owner::<S>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
