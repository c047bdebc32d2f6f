//! Handlers for the processing verification registry.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/processing-steps` | Body: [`NewProcessingStep`]; owner only |
//! | `GET`  | `/processing-steps/{id}` | 404 if not found |
//! | `POST` | `/batch-processing` | Body: [`NewBatchProcessing`] |
//! | `GET`  | `/batch-processing/{id}` | 404 if not found |
//! | `POST` | `/batch-processing/{id}/verify` | Owner only; idempotent |
//! | `GET`  | `/batches/{id}/processing` | History of one batch |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use weft_core::{
  command::{Command, Outcome},
  kind::EntityKind,
  primitives::{EntityId, Record},
  processing::{BatchProcessing, NewBatchProcessing, NewProcessingStep, ProcessingStep},
  store::LedgerStore,
};

use crate::{ApiState, Caller, body::JsonBody, error::ApiError};

// ─── Steps ───────────────────────────────────────────────────────────────────

/// `POST /processing-steps`
pub async fn register_step<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewProcessingStep>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state.execute(caller, Command::RegisterProcessingStep(body)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /processing-steps/{id}`
pub async fn get_step<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Record<ProcessingStep>>, ApiError> {
  let step = state
    .store
    .get_processing_step(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::ProcessingStep, id))?;
  Ok(Json(Record::new(id, step)))
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// `POST /batch-processing`
pub async fn record<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewBatchProcessing>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state.execute(caller, Command::RecordBatchProcessing(body)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /batch-processing/{id}`
pub async fn get_record<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Record<BatchProcessing>>, ApiError> {
  let record = state
    .store
    .get_batch_processing(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::BatchProcessing, id))?;
  Ok(Json(Record::new(id, record)))
}

/// `POST /batch-processing/{id}/verify`
pub async fn verify<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  Path(record_id): Path<EntityId>,
) -> Result<Json<Outcome>, ApiError> {
  let outcome = state.execute(caller, Command::VerifyBatchProcessing { record_id }).await?;
  Ok(Json(outcome))
}

/// `GET /batches/{id}/processing`
pub async fn processing_history<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(batch_id): Path<EntityId>,
) -> Result<Json<Vec<Record<BatchProcessing>>>, ApiError> {
  if state.store.get_batch(batch_id).await.is_none() {
    return Err(ApiError::not_found(EntityKind::Batch, batch_id));
  }
  Ok(Json(state.store.processing_history(batch_id).await))
}
