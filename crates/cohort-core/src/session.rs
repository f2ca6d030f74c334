//! The per-login session context.
//!
//! A session binds one participant to an opaque client token and records
//! whether the admin view has been unlocked. Sessions are passed explicitly
//! to whatever needs them; there is no process-wide "current user".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub participant_id: Uuid,
  pub admin_unlocked: bool,
  pub started_at:     DateTime<Utc>,
}

impl Session {
  pub fn new(participant_id: Uuid) -> Self {
    Self { participant_id, admin_unlocked: false, started_at: Utc::now() }
  }

  pub fn unlock_admin(&mut self) { self.admin_unlocked = true; }

  /// Whether this session may act on `participant_id`'s data.
  pub fn owns(&self, participant_id: Uuid) -> bool { self.participant_id == participant_id }
}
