//! HTTP Basic authentication, resolving credentials to a [`Principal`].
//!
//! Requests without an `Authorization` header proceed anonymously; the API
//! rejects anonymous mutations itself. A header that is present but fails to
//! verify is rejected here with 401.

use std::{collections::BTreeMap, sync::Arc};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use weft_core::primitives::Principal;

use crate::error::Error;

/// One configured login.
#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
  pub name:          Principal,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Credentials accepted by this server instance, keyed by principal name.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  principals: BTreeMap<String, String>,
}

impl AuthConfig {
  pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
    let principals = credentials
      .into_iter()
      .map(|c| (c.name.as_str().to_owned(), c.password_hash))
      .collect();
    Self { principals }
  }

  pub fn knows(&self, principal: &Principal) -> bool {
    self.principals.contains_key(principal.as_str())
  }
}

/// Verify credentials from headers. `Ok(None)` means no credentials were
/// offered.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<Option<Principal>, Error> {
  let Some(header_val) = headers.get(axum::http::header::AUTHORIZATION) else {
    return Ok(None);
  };
  let header_val = header_val.to_str().map_err(|_| Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let stored = config.principals.get(username).ok_or(Error::Unauthorized)?;
  let parsed_hash = PasswordHash::new(stored).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(Some(Principal::new(username)))
}

/// Middleware: attach the authenticated [`Principal`] to the request
/// extensions, or reject bad credentials.
pub async fn authenticate(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Response {
  match verify_auth(req.headers(), &auth) {
    Ok(Some(principal)) => {
      req.extensions_mut().insert(principal);
      next.run(req).await
    }
    Ok(None) => next.run(req).await,
    Err(e) => {
      tracing::warn!(uri = %req.uri(), "rejected credentials");
      e.into_response()
    }
  }
}
