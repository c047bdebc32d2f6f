//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use weft_core::{AsLedgerError, kind::EntityKind, primitives::EntityId};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthenticated,

  #[error("{0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("{0}")]
  Unprocessable(String),

  #[error("{0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn not_found(kind: EntityKind, id: EntityId) -> Self {
    Self::NotFound(format!("{kind} {id} not found"))
  }

  /// Classify a store error: ledger rejections map to client errors,
  /// anything else is a server error.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + AsLedgerError + Send + Sync + 'static,
  {
    match err.ledger_error() {
      Some(ledger) => Self::from(ledger.clone()),
      None => Self::Store(Box::new(err)),
    }
  }
}

impl From<weft_core::Error> for ApiError {
  fn from(err: weft_core::Error) -> Self {
    use weft_core::Error as E;
    match err {
      E::Unauthorized { .. } => Self::Forbidden(err.to_string()),
      E::NotFound { .. } => Self::NotFound(err.to_string()),
      E::InvalidRange(_) | E::MalformedHash(_) => Self::Unprocessable(err.to_string()),
      E::ClockRegression { .. } => Self::Conflict(err.to_string()),
      E::IdentifierSpaceExhausted(_) => Self::Store(Box::new(err)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
