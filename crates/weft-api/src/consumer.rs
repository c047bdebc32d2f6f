//! Handlers for the consumer verification registry.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/verifications` | Body: [`NewProductVerification`]; owner only |
//! | `GET`  | `/verifications/{id}` | 404 if not found |
//! | `POST` | `/verifications/{id}/scans` | Body: `{"location":".."}` |
//! | `GET`  | `/verifications/{id}/scans` | Scans of one verification |
//! | `GET`  | `/scans/{id}` | 404 if not found |
//! | `POST` | `/feedback` | Body: [`NewProductFeedback`]; rating 1..=5 |
//! | `GET`  | `/feedback/{id}` | 404 if not found |
//! | `GET`  | `/products/{id}/verifications` | 404 if the product is unknown |
//! | `GET`  | `/products/{id}/feedback` | Entries plus rating summary; 404 if the product is unknown |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use weft_core::{
  command::Command,
  consumer::{
    ConsumerScan, FeedbackSummary, NewConsumerScan, NewProductFeedback, NewProductVerification,
    ProductFeedback, ProductVerification,
  },
  kind::EntityKind,
  primitives::{EntityId, Record},
  store::LedgerStore,
};

use crate::{ApiState, Caller, body::JsonBody, error::ApiError};

// ─── Verifications ───────────────────────────────────────────────────────────

/// `POST /verifications`
pub async fn create_verification<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewProductVerification>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state.execute(caller, Command::CreateProductVerification(body)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /verifications/{id}`
pub async fn get_verification<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Record<ProductVerification>>, ApiError> {
  let verification = state
    .store
    .get_product_verification(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::ProductVerification, id))?;
  Ok(Json(Record::new(id, verification)))
}

/// `GET /products/{id}/verifications`
pub async fn verifications_for_product<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(product_id): Path<EntityId>,
) -> Result<Json<Vec<Record<ProductVerification>>>, ApiError> {
  let verifications = state.store.verifications_for_product(product_id).await;
  require_product(&state, product_id, verifications.is_empty()).await?;
  Ok(Json(verifications))
}

/// 404 for a product that was never registered, unless records already
/// reference it (possible when product integrity is unchecked).
async fn require_product<S: LedgerStore>(
  state: &ApiState<S>,
  product_id: EntityId,
  unreferenced: bool,
) -> Result<(), ApiError> {
  if unreferenced && state.store.get_product(product_id).await.is_none() {
    return Err(ApiError::not_found(EntityKind::Product, product_id));
  }
  Ok(())
}

// ─── Scans ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScanBody {
  pub location: String,
}

/// `POST /verifications/{id}/scans`
pub async fn record_scan<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  Path(verification_id): Path<EntityId>,
  JsonBody(body): JsonBody<ScanBody>,
) -> Result<impl IntoResponse, ApiError> {
  let scan = NewConsumerScan { verification_id, location: body.location };
  let outcome = state.execute(caller, Command::RecordConsumerScan(scan)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /verifications/{id}/scans`
pub async fn scans_for_verification<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(verification_id): Path<EntityId>,
) -> Result<Json<Vec<Record<ConsumerScan>>>, ApiError> {
  if state.store.get_product_verification(verification_id).await.is_none() {
    return Err(ApiError::not_found(EntityKind::ProductVerification, verification_id));
  }
  Ok(Json(state.store.scans_for_verification(verification_id).await))
}

/// `GET /scans/{id}`
pub async fn get_scan<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Record<ConsumerScan>>, ApiError> {
  let scan = state
    .store
    .get_consumer_scan(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::ConsumerScan, id))?;
  Ok(Json(Record::new(id, scan)))
}

// ─── Feedback ────────────────────────────────────────────────────────────────

/// `POST /feedback`
pub async fn submit_feedback<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewProductFeedback>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state.execute(caller, Command::SubmitProductFeedback(body)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /feedback/{id}`
pub async fn get_feedback<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Record<ProductFeedback>>, ApiError> {
  let feedback = state
    .store
    .get_product_feedback(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::ProductFeedback, id))?;
  Ok(Json(Record::new(id, feedback)))
}

#[derive(Debug, Serialize)]
pub struct ProductFeedbackPage {
  pub summary:  FeedbackSummary,
  pub feedback: Vec<Record<ProductFeedback>>,
}

/// `GET /products/{id}/feedback`
pub async fn feedback_for_product<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(product_id): Path<EntityId>,
) -> Result<Json<ProductFeedbackPage>, ApiError> {
  let feedback = state.store.feedback_for_product(product_id).await;
  require_product(&state, product_id, feedback.is_empty()).await?;
  let summary = state.store.feedback_summary(product_id).await;
  Ok(Json(ProductFeedbackPage { summary, feedback }))
}
