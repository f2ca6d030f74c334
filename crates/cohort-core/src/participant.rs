//! Participants of the cohort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, submission::RequiredSet};

/// Glyphs handed out to participants who have not picked an avatar.
pub const FALLBACK_AVATARS: &[&str] = &[
  "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐮", "🐷",
  "🐸", "🐵", "🐔", "🐧", "🐦", "🦆", "🦉", "🐺", "🐴", "🦄", "🐢",
];

/// A cohort member. Created on first login by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
  pub participant_id:      Uuid,
  /// Unique display name, stored trimmed.
  pub username:            String,
  pub avatar:              Option<String>,
  /// Free-form background colour tag chosen by the participant.
  pub bg_color:            Option<String>,
  /// Enrolled in the optional column track.
  pub is_column_challenge: bool,
  pub created_at:          DateTime<Utc>,
}

impl Participant {
  pub fn required_set(&self) -> RequiredSet { RequiredSet::new(self.is_column_challenge) }

  /// The stored avatar, or a stable glyph derived from the username.
  pub fn display_avatar(&self) -> &str {
    self
      .avatar
      .as_deref()
      .filter(|a| !a.is_empty())
      .unwrap_or_else(|| fallback_avatar(&self.username))
  }
}

/// Pick a glyph from [`FALLBACK_AVATARS`] by hashing `username`.
///
/// A wrapping 32-bit `h * 31 + c` hash over UTF-16 code units. It is stable
/// across runs and platforms, but for long names it does not reproduce the
/// glyph a floating-point hash of the same string would choose.
pub fn fallback_avatar(username: &str) -> &'static str {
  let hash = username
    .encode_utf16()
    .fold(0i32, |h, c| i32::from(c).wrapping_add(h.wrapping_shl(5).wrapping_sub(h)));
  FALLBACK_AVATARS[hash.unsigned_abs() as usize % FALLBACK_AVATARS.len()]
}

/// Trim a proposed username, rejecting blanks.
pub fn normalize_username(raw: &str) -> Result<String> {
  let name = raw.trim();
  if name.is_empty() {
    return Err(Error::EmptyUsername);
  }
  Ok(name.to_owned())
}

/// Input to [`crate::store::CohortStore::update_profile`].
///
/// `avatar` and `bg_color` are only changed when `Some` and non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
  pub username: String,
  #[serde(default)]
  pub avatar:   Option<String>,
  #[serde(default)]
  pub bg_color: Option<String>,
}

impl ProfileUpdate {
  /// Trim every field; drop blank optional fields.
  pub fn normalized(self) -> Result<Self> {
    let keep = |v: Option<String>| {
      v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
    };
    Ok(Self {
      username: normalize_username(&self.username)?,
      avatar:   keep(self.avatar),
      bg_color: keep(self.bg_color),
    })
  }
}
