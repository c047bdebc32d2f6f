//! Handlers for the material sourcing registry.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/materials` | Body: [`NewMaterial`]; owner only |
//! | `GET`  | `/materials/{id}` | 404 if not found |
//! | `GET`  | `/materials/{id}/batches` | Batches drawn from the material |
//! | `POST` | `/batches` | Body: [`NewBatch`]; owner only |
//! | `GET`  | `/batches/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use weft_core::{
  command::Command,
  kind::EntityKind,
  material::{Batch, Material, NewBatch, NewMaterial},
  primitives::{EntityId, Record},
  store::LedgerStore,
};

use crate::{ApiState, Caller, body::JsonBody, error::ApiError};

/// `POST /materials`
pub async fn register_material<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewMaterial>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state.execute(caller, Command::RegisterMaterial(body)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /materials/{id}`
pub async fn get_material<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Record<Material>>, ApiError> {
  let material = state
    .store
    .get_material(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::Material, id))?;
  Ok(Json(Record::new(id, material)))
}

/// `GET /materials/{id}/batches`
pub async fn batches_of_material<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Vec<Record<Batch>>>, ApiError> {
  if state.store.get_material(id).await.is_none() {
    return Err(ApiError::not_found(EntityKind::Material, id));
  }
  Ok(Json(state.store.batches_of_material(id).await))
}

/// `POST /batches`
pub async fn register_batch<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewBatch>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = state.execute(caller, Command::RegisterBatch(body)).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /batches/{id}`
pub async fn get_batch<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<EntityId>,
) -> Result<Json<Record<Batch>>, ApiError> {
  let batch = state
    .store
    .get_batch(id)
    .await
    .ok_or_else(|| ApiError::not_found(EntityKind::Batch, id))?;
  Ok(Json(Record::new(id, batch)))
}
