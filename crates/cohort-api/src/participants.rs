//! Handlers for `/participants` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/participants` | Ordered by username |
//! | `GET`    | `/participants/:id` | 404 if not found |
//! | `PATCH`  | `/participants/me` | Body: `ProfileUpdate`; 409 on a taken name |
//! | `PUT`    | `/participants/me/column` | Body: `{"enabled":true}` |
//! | `DELETE` | `/participants/:id` | Admin only; removes their submissions too |
//! | `GET`    | `/participants/:id/submissions` | Oldest first |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use cohort_core::{
  participant::{Participant, ProfileUpdate},
  store::CohortStore,
  submission::Submission,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  auth::{AdminSession, CurrentSession},
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /participants`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  _current: CurrentSession,
) -> Result<Json<Vec<Participant>>, ApiError>
where
  S: CohortStore + 'static,
{
  let participants = state
    .store
    .list_participants()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(participants))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /participants/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  _current: CurrentSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Participant>, ApiError>
where
  S: CohortStore + 'static,
{
  let participant = require(&state, id).await?;
  Ok(Json(participant))
}

pub(crate) async fn require<S>(state: &ApiState<S>, id: Uuid) -> Result<Participant, ApiError>
where
  S: CohortStore + 'static,
{
  state
    .store
    .get_participant(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("participant {id} not found")))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

/// `PATCH /participants/me`
pub async fn update_me<S>(
  State(state): State<ApiState<S>>,
  current: CurrentSession,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Participant>, ApiError>
where
  S: CohortStore + 'static,
{
  let updated = state
    .store
    .update_profile(current.participant.participant_id, body)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct ColumnBody {
  pub enabled: bool,
}

/// `PUT /participants/me/column` — join or leave the column track.
pub async fn set_column<S>(
  State(state): State<ApiState<S>>,
  current: CurrentSession,
  Json(body): Json<ColumnBody>,
) -> Result<Json<Participant>, ApiError>
where
  S: CohortStore + 'static,
{
  let updated = state
    .store
    .set_column_challenge(current.participant.participant_id, body.enabled)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    participant = %updated.participant_id,
    enabled = body.enabled,
    "column track changed"
  );
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /participants/:id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  AdminSession(admin): AdminSession,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CohortStore + 'static,
{
  let removed = state
    .store
    .delete_participant(id)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("participant {id} not found")));
  }

  state.sessions.revoke_participant(id);
  tracing::info!(participant = %id, by = %admin.participant.participant_id, "participant deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Submissions ──────────────────────────────────────────────────────────────

/// `GET /participants/:id/submissions`
pub async fn submissions<S>(
  State(state): State<ApiState<S>>,
  _current: CurrentSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: CohortStore + 'static,
{
  require(&state, id).await?;
  let submissions = state
    .store
    .list_submissions(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(submissions))
}
