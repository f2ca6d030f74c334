//! [`SqliteStore`] — the SQLite implementation of [`CohortStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use cohort_core::{
  participant::{Participant, ProfileUpdate, normalize_username},
  store::{CohortStore, SubmissionRecord},
  submission::{NewSubmission, Submission, SubmissionKind},
};

use crate::{
  Error, Result,
  encode::{
    PARTICIPANT_COLUMNS, RawParticipant, RawRecord, RawSubmission, SUBMISSION_COLUMNS,
    Violation, decode_uuid, encode_date, encode_dt, encode_uuid, violation,
  },
  schema::SCHEMA,
};

/// Outcome of a write that may trip a constraint.
enum Write {
  Done,
  Conflict,
  Missing,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A cohort store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_submissions(
    &self,
    filter: &'static str,
    key: String,
  ) -> Result<Vec<Submission>> {
    let raws: Vec<RawSubmission> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBMISSION_COLUMNS} FROM journals WHERE {filter} ORDER BY date, type"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![key], RawSubmission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmission::into_submission).collect()
  }

  async fn require_participant(&self, id: Uuid) -> Result<Participant> {
    self
      .get_participant(id)
      .await?
      .ok_or_else(|| cohort_core::Error::ParticipantNotFound(id).into())
  }
}

// ─── CohortStore impl ────────────────────────────────────────────────────────

impl CohortStore for SqliteStore {
  type Error = Error;

  // ── Participants ──────────────────────────────────────────────────────────

  async fn add_participant(&self, username: &str) -> Result<Participant> {
    let participant = Participant {
      participant_id:      Uuid::new_v4(),
      username:            normalize_username(username)?,
      avatar:              None,
      bg_color:            None,
      is_column_challenge: false,
      created_at:          Utc::now(),
    };

    let id_str = encode_uuid(participant.participant_id);
    let name = participant.username.clone();
    let at_str = encode_dt(participant.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO users (id, username, is_column_challenge, created_at)
           VALUES (?1, ?2, 0, ?3)",
          rusqlite::params![id_str, name, at_str],
        ) {
          Ok(_) => Ok(Write::Done),
          Err(e) if violation(&e) == Some(Violation::Unique) => Ok(Write::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Write::Done => Ok(participant),
      _ => Err(cohort_core::Error::UsernameTaken(participant.username).into()),
    }
  }

  async fn get_participant(&self, id: Uuid) -> Result<Option<Participant>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawParticipant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PARTICIPANT_COLUMNS} FROM users WHERE id = ?1"),
              rusqlite::params![id_str],
              RawParticipant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawParticipant::into_participant).transpose()
  }

  async fn find_participant(&self, username: &str) -> Result<Option<Participant>> {
    let name = username.trim().to_owned();

    let raw: Option<RawParticipant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PARTICIPANT_COLUMNS} FROM users WHERE username = ?1"),
              rusqlite::params![name],
              RawParticipant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawParticipant::into_participant).transpose()
  }

  async fn list_participants(&self) -> Result<Vec<Participant>> {
    let raws: Vec<RawParticipant> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {PARTICIPANT_COLUMNS} FROM users ORDER BY username"))?;
        let rows = stmt
          .query_map([], RawParticipant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParticipant::into_participant).collect()
  }

  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Participant> {
    let update = update.normalized()?;
    let id_str = encode_uuid(id);
    let name = update.username.clone();
    let avatar = update.avatar.clone();
    let bg_color = update.bg_color.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "UPDATE users
             SET username = ?2,
                 avatar   = COALESCE(?3, avatar),
                 bg_color = COALESCE(?4, bg_color)
           WHERE id = ?1",
          rusqlite::params![id_str, name, avatar, bg_color],
        ) {
          Ok(0) => Ok(Write::Missing),
          Ok(_) => Ok(Write::Done),
          Err(e) if violation(&e) == Some(Violation::Unique) => Ok(Write::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Write::Done => self.require_participant(id).await,
      Write::Conflict => Err(cohort_core::Error::UsernameTaken(update.username).into()),
      Write::Missing => Err(cohort_core::Error::ParticipantNotFound(id).into()),
    }
  }

  async fn set_column_challenge(&self, id: Uuid, enabled: bool) -> Result<Participant> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET is_column_challenge = ?2 WHERE id = ?1",
          rusqlite::params![id_str, enabled],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(cohort_core::Error::ParticipantNotFound(id).into());
    }
    self.require_participant(id).await
  }

  async fn delete_participant(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(removed > 0)
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn upsert_submission(&self, input: NewSubmission) -> Result<Submission> {
    let fresh_id = Uuid::new_v4();
    let created_at = Utc::now();

    let id_str = encode_uuid(fresh_id);
    let user_str = encode_uuid(input.participant_id);
    let date_str = encode_date(input.date);
    let kind_str = input.kind.discriminant();
    let link = input.link.clone();
    let amount = input.amount;
    let at_str = encode_dt(created_at);

    // On conflict the original row id is kept and returned.
    let stored_id: Option<String> = self
      .conn
      .call(move |conn| {
        match conn.query_row(
          "INSERT INTO journals (id, user_id, date, type, link, amount, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (user_id, date, type) DO UPDATE
             SET link       = excluded.link,
                 amount     = excluded.amount,
                 created_at = excluded.created_at
           RETURNING id",
          rusqlite::params![id_str, user_str, date_str, kind_str, link, amount, at_str],
          |row| row.get(0),
        ) {
          Ok(id) => Ok(Some(id)),
          Err(e) if violation(&e) == Some(Violation::ForeignKey) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let stored_id = stored_id
      .ok_or(cohort_core::Error::ParticipantNotFound(input.participant_id))?;

    Ok(Submission {
      submission_id:  decode_uuid(&stored_id)?,
      participant_id: input.participant_id,
      date:           input.date,
      kind:           input.kind,
      link:           input.link,
      amount:         input.amount,
      created_at,
    })
  }

  async fn delete_submission(
    &self,
    participant_id: Uuid,
    date: NaiveDate,
    kind: SubmissionKind,
  ) -> Result<bool> {
    let user_str = encode_uuid(participant_id);
    let date_str = encode_date(date);
    let kind_str = kind.discriminant();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM journals WHERE user_id = ?1 AND date = ?2 AND type = ?3",
          rusqlite::params![user_str, date_str, kind_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn list_submissions(&self, participant_id: Uuid) -> Result<Vec<Submission>> {
    self.query_submissions("user_id = ?1", encode_uuid(participant_id)).await
  }

  async fn submissions_on(&self, date: NaiveDate) -> Result<Vec<Submission>> {
    self.query_submissions("date = ?1", encode_date(date)).await
  }

  async fn list_all_submissions(
    &self,
    limit: usize,
    offset: usize,
  ) -> Result<Vec<SubmissionRecord>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset_val = i64::try_from(offset).unwrap_or(i64::MAX);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT j.id, u.username, j.date, j.type, j.link, j.amount, j.created_at
           FROM journals j
           JOIN users u ON u.id = j.user_id
           ORDER BY j.date DESC, j.created_at DESC
           LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val, offset_val], |row| {
            Ok(RawRecord {
              id:         row.get(0)?,
              username:   row.get(1)?,
              date:       row.get(2)?,
              kind:       row.get(3)?,
              link:       row.get(4)?,
              amount:     row.get(5)?,
              created_at: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}
