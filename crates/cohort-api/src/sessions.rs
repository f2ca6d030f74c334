//! Handlers for `/session` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/session` | Body: `{"username":"…"}`; creates the participant on first use |
//! | `GET`    | `/session` | The caller's session |
//! | `DELETE` | `/session` | Logout; 204 |
//! | `POST`   | `/session/admin` | Body: `{"password":"…"}`; 401 on mismatch |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use cohort_core::{
  participant::{Participant, normalize_username},
  store::{CohortStore, StoreError as _},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, auth::CurrentSession, error::ApiError};

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:          String,
  pub participant:    Participant,
  pub admin_unlocked: bool,
}

/// `POST /session` — log in by username, registering it if unknown.
pub async fn login<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: CohortStore + 'static,
{
  let username = normalize_username(&body.username)?;
  let participant = find_or_register(&state, &username).await?;

  let token = state.sessions.issue(participant.participant_id);
  tracing::info!(participant = %participant.participant_id, %username, "session started");

  Ok(Json(LoginResponse { token, participant, admin_unlocked: false }))
}

async fn find_or_register<S>(state: &ApiState<S>, username: &str) -> Result<Participant, ApiError>
where
  S: CohortStore + 'static,
{
  if let Some(existing) = state
    .store
    .find_participant(username)
    .await
    .map_err(ApiError::store)?
  {
    return Ok(existing);
  }

  match state.store.add_participant(username).await {
    Ok(created) => {
      tracing::info!(participant = %created.participant_id, %username, "participant registered");
      Ok(created)
    }
    // Lost a race with a concurrent first login under the same name.
    Err(e) if matches!(e.as_core(), Some(cohort_core::Error::UsernameTaken(_))) => state
      .store
      .find_participant(username)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::Conflict(format!("username {username:?} is taken"))),
    Err(e) => Err(ApiError::store(e)),
  }
}

// ─── Current ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionView {
  pub participant:    Participant,
  pub admin_unlocked: bool,
  pub started_at:     DateTime<Utc>,
}

/// `GET /session`
pub async fn current<S>(current: CurrentSession) -> Json<SessionView>
where
  S: CohortStore + 'static,
{
  Json(SessionView {
    participant:    current.participant,
    admin_unlocked: current.session.admin_unlocked,
    started_at:     current.session.started_at,
  })
}

// ─── Logout ───────────────────────────────────────────────────────────────────

/// `DELETE /session`
pub async fn logout<S>(
  State(state): State<ApiState<S>>,
  current: CurrentSession,
) -> impl IntoResponse
where
  S: CohortStore + 'static,
{
  state.sessions.revoke(&current.token);
  tracing::info!(participant = %current.participant.participant_id, "session ended");
  StatusCode::NO_CONTENT
}

// ─── Admin unlock ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UnlockBody {
  pub password: String,
}

/// `POST /session/admin` — unlock the admin view for this session only.
pub async fn unlock_admin<S>(
  State(state): State<ApiState<S>>,
  current: CurrentSession,
  Json(body): Json<UnlockBody>,
) -> Result<Json<SessionView>, ApiError>
where
  S: CohortStore + 'static,
{
  let participant_id = current.participant.participant_id;
  if !state.admin.verify(&body.password) {
    tracing::warn!(participant = %participant_id, "admin unlock rejected");
    return Err(ApiError::Unauthorized);
  }
  if !state.sessions.unlock_admin(&current.token) {
    // Logged out between extraction and here.
    return Err(ApiError::Unauthorized);
  }
  tracing::info!(participant = %participant_id, "admin view unlocked");

  Ok(Json(SessionView {
    participant:    current.participant,
    admin_unlocked: true,
    started_at:     current.session.started_at,
  }))
}
