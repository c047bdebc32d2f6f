//! Handlers for the certification registry and product traces.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/standards` | Body: [`NewStandard`]; owner only |
//! | `GET`  | `/standards/{id}` | 404 if not found |
//! | `POST` | `/products` | Body: [`NewProduct`]; owner only |
//! | `GET`  | `/products/{id}` | 404 if not found |
//! | `POST` | `/products/{id}/batches` | Body: `{"batch_ids":[..]}`; owner only |
//! | `GET`  | `/products/{id}/certifications` | With status at `?at=` (default now) |
//! | `GET`  | `/products/{id}/trace` | Full lineage at `?at=` (default now) |
//! | `POST` | `/certifications` | Body: [`NewCertification`]; owner only |
//! | `GET`  | `/certifications/{id}` | With status at `?at=` (default now) |
//! | `POST` | `/certifications/{id}/revoke` | Owner only; idempotent |

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use weft_core::{
  certification::{NewCertification, NewProduct, NewStandard, Product, Standard},
  command::{Command, Outcome},
  kind::EntityKind,
  ledger::{CertificationView, ProductTrace},
  primitives::{EntityId, Record, Timestamp},
  store::LedgerStore,
};

use crate::{ApiState, Caller, body::JsonBody, error::ApiError};

/// `?at=<unix seconds>`; absent means "now" by the server clock.
#[derive(Debug, Default, Deserialize)]
pub struct AsOf {
  pub at: Option<Timestamp>,
}

impl AsOf {
  fn resolve<S>(&self, state: &ApiState<S>) -> Timestamp {
    self.at.unwrap_or_else(|| state.clock.now())
  }
}

// ─── Standards ───────────────────────────────────────────────────────────────

/// `POST /standards`
pub async fn register_standard<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewStandard>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state.execute(caller, Command::RegisterStandard(body)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /standards/{id}`
pub async fn get_standard<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Record<Standard>>, ApiError> {
  let standard = state
    .store
    .get_standard(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::Standard, id))?;
  Ok(Json(Record::new(id, standard)))
}

// ─── Products ────────────────────────────────────────────────────────────────

/// `POST /products`
pub async fn register_product<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewProduct>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state.execute(caller, Command::RegisterProduct(body)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /products/{id}`
pub async fn get_product<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Record<Product>>, ApiError> {
  let product = state
    .store
    .get_product(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::Product, id))?;
  Ok(Json(Record::new(id, product)))
}

#[derive(Debug, Deserialize)]
pub struct AppendBatchesBody {
  pub batch_ids: BTreeSet<EntityId>,
}

/// `POST /products/{id}/batches`
pub async fn append_batches<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  Path(product_id): Path<EntityId>,
  JsonBody(body): JsonBody<AppendBatchesBody>,
) -> Result<Json<Outcome>, ApiError> {
  let command = Command::AppendProductBatches { product_id, batch_ids: body.batch_ids };
  Ok(Json(state.execute(caller, command).await?))
}

/// `GET /products/{id}/certifications`
pub async fn certifications_for_product<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(product_id): Path<EntityId>,
  Query(as_of): Query<AsOf>,
) -> Result<Json<Vec<CertificationView>>, ApiError> {
  if state.store.get_product(product_id).await.is_none() {
    return Err(ApiError::not_found(EntityKind::Product, product_id));
  }
  let at = as_of.resolve(&state);
  let views = state
    .store
    .certifications_for_product(product_id)
    .await
    .into_iter()
    .map(|record| {
      let status = record.entity.status_at(at);
      CertificationView { record, status }
    })
    .collect();
  Ok(Json(views))
}

/// `GET /products/{id}/trace`
pub async fn trace<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(product_id): Path<EntityId>,
  Query(as_of): Query<AsOf>,
) -> Result<Json<ProductTrace>, ApiError> {
  let at = as_of.resolve(&state);
  let trace = state
    .store
    .trace_product(product_id, at)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::Product, product_id))?;
  Ok(Json(trace))
}

// ─── Certifications ──────────────────────────────────────────────────────────

/// `POST /certifications`
pub async fn issue<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewCertification>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state.execute(caller, Command::IssueCertification(body)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /certifications/{id}`
pub async fn get_certification<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
  Query(as_of): Query<AsOf>,
) -> Result<Json<CertificationView>, ApiError> {
  let certification = state
    .store
    .get_certification(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::Certification, id))?;
  let status = certification.status_at(as_of.resolve(&state));
  Ok(Json(CertificationView { record: Record::new(id, certification), status }))
}

/// `POST /certifications/{id}/revoke`
pub async fn revoke<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  Path(certification_id): Path<EntityId>,
) -> Result<Json<Outcome>, ApiError> {
  let command = Command::RevokeCertification { certification_id };
  Ok(Json(state.execute(caller, command).await?))
}
