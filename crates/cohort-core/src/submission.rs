//! Submissions: one record per (participant, date, kind).
//!
//! A participant logs at most one submission of each kind per calendar day.
//! Writes are upserts; the store replaces the payload of an existing record
//! rather than appending a second one.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};
use uuid::Uuid;

use crate::{Error, Result};

/// Payload stored when a submission is logged without a link or note.
pub const COMPLETED_MARKER: &str = "completed";

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The closed set of daily task categories.
///
/// The serialised names are the discriminants stored in the `type` column.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
)]
pub enum SubmissionKind {
  #[serde(rename = "journal")]
  #[strum(serialize = "journal")]
  Journal,
  /// Daily household account book entry; the only kind carrying an amount.
  #[serde(rename = "account")]
  #[strum(serialize = "account")]
  AccountLedger,
  #[serde(rename = "thread")]
  #[strum(serialize = "thread")]
  ThreadPost,
  /// Confirmation of the daily call with an accountability mate.
  #[serde(rename = "mate")]
  #[strum(serialize = "mate")]
  AccountabilityCall,
  /// Only required from participants enrolled in the column track.
  #[serde(rename = "column")]
  #[strum(serialize = "column")]
  ColumnPost,
}

impl SubmissionKind {
  /// The discriminant string stored in the database.
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::Journal => "journal",
      Self::AccountLedger => "account",
      Self::ThreadPost => "thread",
      Self::AccountabilityCall => "mate",
      Self::ColumnPost => "column",
    }
  }

  /// Parse a stored discriminant.
  pub fn from_discriminant(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::UnknownSubmissionKind(s.to_owned()))
  }

  /// Every kind, in display order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }
}

// ─── Required set ────────────────────────────────────────────────────────────

/// The kinds a participant must submit on each weekday.
///
/// Derived from the participant's *current* column flag whenever it is
/// evaluated, so toggling the flag also changes the outcome for days that
/// have already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredSet {
  pub column_track: bool,
}

impl RequiredSet {
  pub fn new(column_track: bool) -> Self { Self { column_track } }

  pub fn contains(&self, kind: SubmissionKind) -> bool {
    kind != SubmissionKind::ColumnPost || self.column_track
  }

  pub fn kinds(&self) -> impl Iterator<Item = SubmissionKind> + '_ {
    SubmissionKind::all().filter(|k| self.contains(*k))
  }

  pub fn len(&self) -> usize { if self.column_track { 5 } else { 4 } }

  pub fn is_empty(&self) -> bool { false }

  /// Required kinds absent from `submitted`, in display order.
  pub fn missing(&self, submitted: &BTreeSet<SubmissionKind>) -> Vec<SubmissionKind> {
    self.kinds().filter(|k| !submitted.contains(k)).collect()
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// A persisted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id:  Uuid,
  pub participant_id: Uuid,
  pub date:           NaiveDate,
  pub kind:           SubmissionKind,
  /// URL or short note; [`COMPLETED_MARKER`] when nothing was entered.
  pub link:           String,
  /// Spending total for the day; account-ledger only.
  pub amount:         Option<i64>,
  /// Time of the most recent write to this (participant, date, kind).
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::CohortStore::upsert_submission`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
  pub participant_id: Uuid,
  pub date:           NaiveDate,
  pub kind:           SubmissionKind,
  pub link:           String,
  pub amount:         Option<i64>,
}

impl NewSubmission {
  /// Build a submission, normalising the payload.
  ///
  /// A blank link becomes [`COMPLETED_MARKER`]. An amount on anything other
  /// than an account-ledger submission is rejected.
  pub fn new(
    participant_id: Uuid,
    date: NaiveDate,
    kind: SubmissionKind,
    link: Option<&str>,
    amount: Option<i64>,
  ) -> Result<Self> {
    if amount.is_some() && kind != SubmissionKind::AccountLedger {
      return Err(Error::AmountNotAllowed);
    }
    let link = match link.map(str::trim) {
      Some(l) if !l.is_empty() => l.to_owned(),
      _ => COMPLETED_MARKER.to_owned(),
    };
    Ok(Self { participant_id, date, kind, link, amount })
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// Per-day view of one participant's submissions: date → kinds logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionHistory {
  days: BTreeMap<NaiveDate, BTreeSet<SubmissionKind>>,
}

impl SubmissionHistory {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, date: NaiveDate, kind: SubmissionKind) {
    self.days.entry(date).or_default().insert(kind);
  }

  /// Insert using an ISO `YYYY-MM-DD` date key.
  pub fn insert_iso(&mut self, date: &str, kind: SubmissionKind) -> Result<()> {
    self.insert(parse_date(date)?, kind);
    Ok(())
  }

  /// Kinds logged on `date`; empty when nothing was recorded.
  pub fn kinds_on(&self, date: NaiveDate) -> BTreeSet<SubmissionKind> {
    self.days.get(&date).cloned().unwrap_or_default()
  }

  pub fn count_on(&self, date: NaiveDate) -> usize {
    self.days.get(&date).map_or(0, BTreeSet::len)
  }

  pub fn is_empty(&self) -> bool { self.days.is_empty() }
}

impl<'a> FromIterator<&'a Submission> for SubmissionHistory {
  fn from_iter<I: IntoIterator<Item = &'a Submission>>(iter: I) -> Self {
    let mut history = Self::new();
    for s in iter {
      history.insert(s.date, s.kind);
    }
    history
  }
}

impl FromIterator<(NaiveDate, SubmissionKind)> for SubmissionHistory {
  fn from_iter<I: IntoIterator<Item = (NaiveDate, SubmissionKind)>>(iter: I) -> Self {
    let mut history = Self::new();
    for (date, kind) in iter {
      history.insert(date, kind);
    }
    history
  }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_owned()))
}
