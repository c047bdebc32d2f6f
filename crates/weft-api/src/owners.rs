//! Handlers for `/registries/{registry}/owner`.
//!
//! `{registry}` is one of `material-sourcing`, `processing-verification`,
//! `certification`, `consumer-verification`.

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use weft_core::{
  command::{Command, Outcome},
  kind::RegistryKind,
  primitives::Principal,
  store::LedgerStore,
};

use crate::{ApiState, Caller, body::JsonBody, error::ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerBody {
  pub owner: Principal,
}

/// `GET /registries/{registry}/owner`
pub async fn get_owner<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Path(registry): Path<RegistryKind>,
) -> Json<OwnerBody> {
  Json(OwnerBody { owner: state.store.contract_owner(registry).await })
}

/// `PUT /registries/{registry}/owner` — current owner only.
pub async fn set_owner<S: LedgerStore>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  Path(registry): Path<RegistryKind>,
  JsonBody(body): JsonBody<OwnerBody>,
) -> Result<Json<Outcome>, ApiError> {
  let command = Command::SetContractOwner { registry, new_owner: body.owner };
  Ok(Json(state.execute(caller, command).await?))
}
