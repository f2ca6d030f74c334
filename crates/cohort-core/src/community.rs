//! Who has logged what today.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  participant::Participant,
  submission::{RequiredSet, SubmissionKind},
};

/// One row of the community sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityEntry {
  pub participant_id:      Uuid,
  pub username:            String,
  pub avatar:              String,
  pub bg_color:            Option<String>,
  pub has_submitted_today: bool,
}

/// Build the community list.
///
/// `submitters` holds everyone with at least one submission on the day. The
/// viewer is listed first; everyone else follows in case-insensitive
/// username order.
pub fn community_list(
  participants: &[Participant],
  submitters: &HashSet<Uuid>,
  viewer: Option<Uuid>,
) -> Vec<CommunityEntry> {
  let mut entries: Vec<CommunityEntry> = participants
    .iter()
    .map(|p| CommunityEntry {
      participant_id:      p.participant_id,
      username:            p.username.clone(),
      avatar:              p.display_avatar().to_owned(),
      bg_color:            p.bg_color.clone(),
      has_submitted_today: submitters.contains(&p.participant_id),
    })
    .collect();

  entries.sort_by(|a, b| {
    let a_first = Some(a.participant_id) == viewer;
    let b_first = Some(b.participant_id) == viewer;
    b_first
      .cmp(&a_first)
      .then_with(|| a.username.to_lowercase().cmp(&b.username.to_lowercase()))
      .then_with(|| a.username.cmp(&b.username))
  });
  entries
}

// ─── Daily status ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindStatus {
  Done,
  Missing,
  /// Column post for someone outside the column track.
  NotRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindProgress {
  pub kind:   SubmissionKind,
  pub status: KindStatus,
}

/// Status of every kind for one participant on one day, in display order.
///
/// A kind outside the required set counts as done when it was submitted
/// anyway.
pub fn daily_status(
  submitted: &BTreeSet<SubmissionKind>,
  required: RequiredSet,
) -> Vec<KindProgress> {
  SubmissionKind::all()
    .map(|kind| {
      let status = if submitted.contains(&kind) {
        KindStatus::Done
      } else if required.contains(kind) {
        KindStatus::Missing
      } else {
        KindStatus::NotRequired
      };
      KindProgress { kind, status }
    })
    .collect()
}
