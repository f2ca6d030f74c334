//! Handlers for `/submissions` endpoints. Both act on the caller's own
//! record.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `PUT`    | `/submissions` | Body: `{"date","kind","link"?,"amount"?}`; replaces any existing entry |
//! | `DELETE` | `/submissions/:date/:kind` | 404 if nothing was logged |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use cohort_core::{
  store::CohortStore,
  submission::{NewSubmission, Submission, SubmissionKind},
};
use serde::Deserialize;

use crate::{ApiState, auth::CurrentSession, error::ApiError};

// ─── Upsert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpsertBody {
  pub date:   NaiveDate,
  pub kind:   SubmissionKind,
  #[serde(default)]
  pub link:   Option<String>,
  #[serde(default)]
  pub amount: Option<i64>,
}

/// `PUT /submissions`
pub async fn upsert<S>(
  State(state): State<ApiState<S>>,
  current: CurrentSession,
  Json(body): Json<UpsertBody>,
) -> Result<Json<Submission>, ApiError>
where
  S: CohortStore + 'static,
{
  let start = state.program.start;
  if body.date < start {
    return Err(cohort_core::Error::BeforeProgramStart { date: body.date, start }.into());
  }

  let input = NewSubmission::new(
    current.participant.participant_id,
    body.date,
    body.kind,
    body.link.as_deref(),
    body.amount,
  )?;
  let stored = state
    .store
    .upsert_submission(input)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    participant = %stored.participant_id,
    date = %stored.date,
    kind = %stored.kind,
    "submission saved"
  );
  Ok(Json(stored))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /submissions/:date/:kind`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  current: CurrentSession,
  Path((date, kind)): Path<(NaiveDate, SubmissionKind)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CohortStore + 'static,
{
  let participant_id = current.participant.participant_id;
  let removed = state
    .store
    .delete_submission(participant_id, date, kind)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("no {kind} submission on {date}")));
  }

  tracing::info!(participant = %participant_id, %date, %kind, "submission removed");
  Ok(StatusCode::NO_CONTENT)
}
