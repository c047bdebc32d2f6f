//! Audit endpoints over the SQLite journal.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/journal` | `?after=<seq>&limit=<n>`; oldest first |
//! | `GET`  | `/journal/verify` | Re-checks the whole hash chain; 409 if broken |

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use weft_store_sqlite::{JournalEntry, JournalReport};

use crate::{AppState, error::Error};

const DEFAULT_PAGE: usize = 100;
const MAX_PAGE: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct JournalParams {
  #[serde(default)]
  pub after: u64,
  pub limit: Option<usize>,
}

/// `GET /journal`
pub async fn list(
  State(state): State<AppState>,
  Query(params): Query<JournalParams>,
) -> Result<Json<Vec<JournalEntry>>, Error> {
  let limit = params.limit.unwrap_or(DEFAULT_PAGE);
  if limit == 0 {
    return Err(Error::BadRequest("limit must be positive".to_string()));
  }
  let entries = state.store.journal(params.after, limit.min(MAX_PAGE)).await?;
  Ok(Json(entries))
}

/// `GET /journal/verify`
pub async fn verify(State(state): State<AppState>) -> Result<Json<JournalReport>, Error> {
  let report = state.store.verify_journal().await?;
  tracing::info!(entries = report.entries, "journal verified");
  Ok(Json(report))
}
