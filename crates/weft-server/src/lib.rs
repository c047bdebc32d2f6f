//! HTTP host for the weft ledger.
//!
//! Composes the [`weft_api`] router over a [`SqliteStore`] with Basic
//! authentication, request tracing, and the journal audit endpoints.

pub mod auth;
pub mod error;
pub mod journal;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use weft_api::{ApiState, api_router};
use weft_core::{
  ledger::LedgerConfig,
  primitives::{Clock, Principal},
};
use weft_store_sqlite::SqliteStore;

use auth::{AuthConfig, Credential};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Initial owner of all four registries. Only consulted when the store is
  /// created; an existing store keeps its recorded deployment.
  pub deployer:   Principal,
  #[serde(default)]
  pub principals: Vec<Credential>,
  #[serde(default)]
  pub ledger:     LedgerConfig,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<SqliteStore>,
  pub auth:  Arc<AuthConfig>,
  pub clock: Arc<dyn Clock>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server [`Router`].
pub fn router(state: AppState) -> Router {
  let api = api_router(ApiState::new(Arc::clone(&state.store), Arc::clone(&state.clock)));
  let credentials = Arc::clone(&state.auth);

  Router::new()
    .route("/journal",        get(journal::list))
    .route("/journal/verify", get(journal::verify))
    .with_state(state)
    .merge(api)
    .layer(middleware::from_fn_with_state(credentials, auth::authenticate))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
