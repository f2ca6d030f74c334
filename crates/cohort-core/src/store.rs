//! The `CohortStore` trait.
//!
//! Implemented by storage backends (e.g. `cohort-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  participant::{Participant, ProfileUpdate},
  submission::{NewSubmission, Submission, SubmissionHistory, SubmissionKind},
};

/// A submission joined with its author's name, for the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
  pub submission_id: Uuid,
  pub username:      String,
  pub date:          NaiveDate,
  pub kind:          SubmissionKind,
  pub link:          String,
  pub amount:        Option<i64>,
  pub created_at:    DateTime<Utc>,
}

/// Backends map their own failures into a type that can surface the
/// domain error behind them, so callers can tell "name taken" apart from an
/// I/O failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

/// Abstraction over a cohort store backend.
///
/// Submissions are keyed by (participant, date, kind); writes replace.
pub trait CohortStore: Send + Sync {
  type Error: StoreError;

  // ── Participants ──────────────────────────────────────────────────────

  /// Create a participant. Fails with `UsernameTaken` on a duplicate name.
  fn add_participant<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + 'a;

  fn get_participant(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + '_;

  /// Look a participant up by exact (trimmed) username.
  fn find_participant<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + 'a;

  /// All participants ordered by username.
  fn list_participants(
    &self,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  /// Rename and restyle a participant; returns the updated record.
  fn update_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  fn set_column_challenge(
    &self,
    id: Uuid,
    enabled: bool,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  /// Remove a participant and all of their submissions. Returns whether a
  /// participant was removed.
  fn delete_participant(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  /// Insert, or replace the payload of, the submission for
  /// (participant, date, kind).
  fn upsert_submission(
    &self,
    input: NewSubmission,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  /// Returns whether a submission was removed.
  fn delete_submission(
    &self,
    participant_id: Uuid,
    date: NaiveDate,
    kind: SubmissionKind,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every submission of one participant, oldest date first.
  fn list_submissions(
    &self,
    participant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  /// Every submission on `date`, across all participants.
  fn submissions_on(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  /// Admin listing: newest date first, then newest write first.
  fn list_all_submissions(
    &self,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Vec<SubmissionRecord>, Self::Error>> + Send + '_;

  /// Per-day history for the fine calculator and calendar.
  fn history(
    &self,
    participant_id: Uuid,
  ) -> impl Future<Output = Result<SubmissionHistory, Self::Error>> + Send + '_ {
    async move {
      let subs = self.list_submissions(participant_id).await?;
      Ok(subs.iter().collect())
    }
  }
}
