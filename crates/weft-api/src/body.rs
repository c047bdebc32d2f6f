//! JSON request bodies whose rejections render as [`ApiError`].

use axum::extract::{FromRequest, rejection::JsonRejection};

use crate::error::ApiError;

/// [`axum::Json`], rejecting with the API's `{"error": …}` body.
///
/// A body that parses but does not fit the target type (a malformed
/// qr-code hash, a rating out of range) is 422; anything else is 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    match rejection {
      JsonRejection::JsonDataError(e) => Self::Unprocessable(e.body_text()),
      other => Self::BadRequest(other.body_text()),
    }
  }
}
