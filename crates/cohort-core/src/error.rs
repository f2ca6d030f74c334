//! Error types for `cohort-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("name is required")]
  EmptyUsername,

  #[error("name already taken: {0:?}")]
  UsernameTaken(String),

  #[error("participant not found: {0}")]
  ParticipantNotFound(Uuid),

  #[error("unknown submission kind: {0:?}")]
  UnknownSubmissionKind(String),

  #[error("an amount can only be recorded for account-ledger submissions")]
  AmountNotAllowed,

  #[error("{date} is before the program start ({start})")]
  BeforeProgramStart { date: NaiveDate, start: NaiveDate },

  #[error("invalid date: {0:?}")]
  InvalidDate(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
