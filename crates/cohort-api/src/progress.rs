//! Read-only progress views: fines, calendars, daily status and the
//! community list.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/participants/:id/fine` | `?on=YYYY-MM-DD`, defaults to today; covers the previous week |
//! | `GET`  | `/participants/:id/calendar/:year/:month` | 400 on an invalid month |
//! | `GET`  | `/participants/:id/status` | `?on=YYYY-MM-DD`, defaults to today |
//! | `GET`  | `/community` | `?on=YYYY-MM-DD`, defaults to today; caller listed first |
//!
//! Every view uses the participant's *current* column-track flag.

use std::collections::HashSet;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use cohort_core::{
  calendar::{GridContext, MonthGrid, month_grid},
  community::{CommunityEntry, KindProgress, community_list, daily_status},
  fine::FineReport,
  store::CohortStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, auth::CurrentSession, error::ApiError, participants::require};

#[derive(Debug, Default, Deserialize)]
pub struct OnParams {
  pub on: Option<NaiveDate>,
}

impl OnParams {
  fn date<S>(&self, state: &ApiState<S>) -> NaiveDate {
    self.on.unwrap_or_else(|| state.program.today())
  }
}

// ─── Fine ─────────────────────────────────────────────────────────────────────

/// `GET /participants/:id/fine[?on=<date>]`
pub async fn fine<S>(
  State(state): State<ApiState<S>>,
  _current: CurrentSession,
  Path(id): Path<Uuid>,
  Query(params): Query<OnParams>,
) -> Result<Json<FineReport>, ApiError>
where
  S: CohortStore + 'static,
{
  let participant = require(&state, id).await?;
  let history = state.store.history(id).await.map_err(ApiError::store)?;

  let on = params.date(&state);
  let report = state
    .program
    .fine_policy()
    .report(&history, participant.is_column_challenge, on)
    .ok_or_else(|| ApiError::BadRequest(format!("no fine week precedes {on}")))?;
  Ok(Json(report))
}

// ─── Calendar ─────────────────────────────────────────────────────────────────

/// `GET /participants/:id/calendar/:year/:month`
pub async fn calendar<S>(
  State(state): State<ApiState<S>>,
  _current: CurrentSession,
  Path((id, year, month)): Path<(Uuid, i32, u32)>,
) -> Result<Json<MonthGrid>, ApiError>
where
  S: CohortStore + 'static,
{
  let participant = require(&state, id).await?;
  let history = state.store.history(id).await.map_err(ApiError::store)?;

  let ctx = GridContext {
    history:       &history,
    required:      participant.required_set(),
    holidays:      &state.program.holidays,
    program_start: state.program.start,
    today:         state.program.today(),
  };
  let grid = month_grid(year, month, &ctx)
    .ok_or_else(|| ApiError::BadRequest(format!("invalid month {year}-{month:02}")))?;
  Ok(Json(grid))
}

// ─── Daily status ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StatusView {
  pub participant_id: Uuid,
  pub date:           NaiveDate,
  pub required:       usize,
  pub kinds:          Vec<KindProgress>,
}

/// `GET /participants/:id/status[?on=<date>]`
pub async fn status<S>(
  State(state): State<ApiState<S>>,
  _current: CurrentSession,
  Path(id): Path<Uuid>,
  Query(params): Query<OnParams>,
) -> Result<Json<StatusView>, ApiError>
where
  S: CohortStore + 'static,
{
  let participant = require(&state, id).await?;
  let history = state.store.history(id).await.map_err(ApiError::store)?;

  let date = params.date(&state);
  let required = participant.required_set();
  Ok(Json(StatusView {
    participant_id: id,
    date,
    required: required.len(),
    kinds: daily_status(&history.kinds_on(date), required),
  }))
}

// ─── Community ────────────────────────────────────────────────────────────────

/// `GET /community[?on=<date>]`
pub async fn community<S>(
  State(state): State<ApiState<S>>,
  current: CurrentSession,
  Query(params): Query<OnParams>,
) -> Result<Json<Vec<CommunityEntry>>, ApiError>
where
  S: CohortStore + 'static,
{
  let date = params.date(&state);
  let participants = state
    .store
    .list_participants()
    .await
    .map_err(ApiError::store)?;
  let submitters: HashSet<Uuid> = state
    .store
    .submissions_on(date)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|s| s.participant_id)
    .collect();

  Ok(Json(community_list(
    &participants,
    &submitters,
    Some(current.participant.participant_id),
  )))
}
