//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs
//! are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use cohort_core::{
  participant::Participant,
  store::SubmissionRecord,
  submission::{Submission, SubmissionKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Constraint detection ────────────────────────────────────────────────────

/// Which constraint a failed write tripped, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
  Unique,
  ForeignKey,
}

pub fn violation(err: &rusqlite::Error) -> Option<Violation> {
  match err {
    rusqlite::Error::SqliteFailure(e, _) => match e.extended_code {
      rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
        Some(Violation::Unique)
      }
      rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::ForeignKey),
      _ => None,
    },
    _ => None,
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PARTICIPANT_COLUMNS: &str =
  "id, username, avatar, bg_color, is_column_challenge, created_at";

/// Raw values read directly from a `users` row.
pub struct RawParticipant {
  pub id:                  String,
  pub username:            String,
  pub avatar:              Option<String>,
  pub bg_color:            Option<String>,
  pub is_column_challenge: bool,
  pub created_at:          String,
}

impl RawParticipant {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      username:            row.get(1)?,
      avatar:              row.get(2)?,
      bg_color:            row.get(3)?,
      is_column_challenge: row.get(4)?,
      created_at:          row.get(5)?,
    })
  }

  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      participant_id:      decode_uuid(&self.id)?,
      username:            self.username,
      avatar:              self.avatar,
      bg_color:            self.bg_color,
      is_column_challenge: self.is_column_challenge,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

pub const SUBMISSION_COLUMNS: &str = "id, user_id, date, type, link, amount, created_at";

/// Raw values read directly from a `journals` row.
pub struct RawSubmission {
  pub id:         String,
  pub user_id:    String,
  pub date:       String,
  pub kind:       String,
  pub link:       String,
  pub amount:     Option<i64>,
  pub created_at: String,
}

impl RawSubmission {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      user_id:    row.get(1)?,
      date:       row.get(2)?,
      kind:       row.get(3)?,
      link:       row.get(4)?,
      amount:     row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      submission_id:  decode_uuid(&self.id)?,
      participant_id: decode_uuid(&self.user_id)?,
      date:           decode_date(&self.date)?,
      kind:           SubmissionKind::from_discriminant(&self.kind)?,
      link:           self.link,
      amount:         self.amount,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// A `journals` row joined with the author's username.
pub struct RawRecord {
  pub id:         String,
  pub username:   String,
  pub date:       String,
  pub kind:       String,
  pub link:       String,
  pub amount:     Option<i64>,
  pub created_at: String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<SubmissionRecord> {
    Ok(SubmissionRecord {
      submission_id: decode_uuid(&self.id)?,
      username:      self.username,
      date:          decode_date(&self.date)?,
      kind:          SubmissionKind::from_discriminant(&self.kind)?,
      link:          self.link,
      amount:        self.amount,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
