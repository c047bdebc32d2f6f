//! The [`Caller`] extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use weft_core::primitives::Principal;

use crate::error::ApiError;

/// The authenticated principal making the request, read from the request
/// extensions. Rejects with 401 when the host attached none.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Principal>()
      .cloned()
      .map(Caller)
      .ok_or(ApiError::Unauthenticated)
  }
}
