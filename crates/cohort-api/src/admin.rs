//! Handlers for `/admin` endpoints. All require an admin-unlocked session.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/submissions` | `?limit=&offset=`; newest first |

use axum::{
  Json,
  extract::{Query, State},
};
use cohort_core::store::{CohortStore, SubmissionRecord};
use serde::Deserialize;

use crate::{ApiState, auth::AdminSession, error::ApiError};

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

fn default_limit() -> usize { DEFAULT_LIMIT }

#[derive(Debug, Deserialize)]
pub struct PageParams {
  #[serde(default = "default_limit")]
  pub limit:  usize,
  #[serde(default)]
  pub offset: usize,
}

/// `GET /admin/submissions[?limit=<n>&offset=<n>]`
pub async fn list_submissions<S>(
  State(state): State<ApiState<S>>,
  _admin: AdminSession,
  Query(page): Query<PageParams>,
) -> Result<Json<Vec<SubmissionRecord>>, ApiError>
where
  S: CohortStore + 'static,
{
  let records = state
    .store
    .list_all_submissions(page.limit.min(MAX_LIMIT), page.offset)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}
