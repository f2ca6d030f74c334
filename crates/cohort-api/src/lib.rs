//! JSON REST API for the cohort tracker.
//!
//! Exposes an axum [`Router`] backed by any [`CohortStore`]. TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cohort_api::api_router(state))
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod participants;
pub mod progress;
pub mod sessions;
pub mod submissions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, patch, post, put},
};
use chrono::{FixedOffset, NaiveDate, Utc};
use cohort_core::{calendar::Holidays, fine::FinePolicy, store::CohortStore};
use serde::Deserialize;

pub use auth::{AdminGate, SessionRegistry};
pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_fine_per_miss() -> u64 { cohort_core::fine::DEFAULT_FINE_PER_MISS }

/// Program-wide rules, deserialised from the `[program]` config table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramConfig {
  /// First day with an obligation; logging before it is refused.
  pub start:              NaiveDate,
  #[serde(default = "default_fine_per_miss")]
  pub fine_per_miss:      u64,
  /// Offset from UTC used to decide what "today" is.
  #[serde(default)]
  pub utc_offset_minutes: i32,
  #[serde(default)]
  pub holidays:           Holidays,
  /// Freeze "today" at a fixed date instead of reading the clock.
  #[serde(default)]
  pub pinned_today:       Option<NaiveDate>,
}

impl ProgramConfig {
  pub fn new(start: NaiveDate) -> Self {
    Self {
      start,
      fine_per_miss: default_fine_per_miss(),
      utc_offset_minutes: 0,
      holidays: Holidays::new(),
      pinned_today: None,
    }
  }

  pub fn fine_policy(&self) -> FinePolicy {
    FinePolicy { program_start: self.start, per_miss: self.fine_per_miss }
  }

  /// The current calendar date in the program's timezone.
  pub fn today(&self) -> NaiveDate {
    if let Some(pinned) = self.pinned_today {
      return pinned;
    }
    let now = Utc::now();
    // Out-of-range offsets fall back to UTC.
    self
      .utc_offset_minutes
      .checked_mul(60)
      .and_then(FixedOffset::east_opt)
      .map_or_else(|| now.date_naive(), |tz| now.with_timezone(&tz).date_naive())
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub sessions: Arc<SessionRegistry>,
  pub program:  Arc<ProgramConfig>,
  pub admin:    Arc<AdminGate>,
}

// Manual impl: cloning only bumps the `Arc`s, so `S` need not be `Clone`.
impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      sessions: Arc::clone(&self.sessions),
      program:  Arc::clone(&self.program),
      admin:    Arc::clone(&self.admin),
    }
  }
}

impl<S> ApiState<S> {
  pub fn new(store: S, program: ProgramConfig, admin: AdminGate) -> Self {
    Self {
      store:    Arc::new(store),
      sessions: Arc::new(SessionRegistry::new()),
      program:  Arc::new(program),
      admin:    Arc::new(admin),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: CohortStore + 'static,
{
  Router::new()
    // Session
    .route(
      "/session",
      post(sessions::login::<S>)
        .get(sessions::current::<S>)
        .delete(sessions::logout::<S>),
    )
    .route("/session/admin", post(sessions::unlock_admin::<S>))
    // Participants
    .route("/participants", get(participants::list::<S>))
    .route("/participants/me", patch(participants::update_me::<S>))
    .route("/participants/me/column", put(participants::set_column::<S>))
    .route(
      "/participants/{id}",
      get(participants::get_one::<S>).delete(participants::delete_one::<S>),
    )
    .route("/participants/{id}/submissions", get(participants::submissions::<S>))
    // Progress
    .route("/participants/{id}/fine", get(progress::fine::<S>))
    .route("/participants/{id}/calendar/{year}/{month}", get(progress::calendar::<S>))
    .route("/participants/{id}/status", get(progress::status::<S>))
    .route("/community", get(progress::community::<S>))
    // Submissions
    .route("/submissions", put(submissions::upsert::<S>))
    .route("/submissions/{date}/{kind}", delete(submissions::remove::<S>))
    // Admin
    .route("/admin/submissions", get(admin::list_submissions::<S>))
    .with_state(state)
}


// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
