//! Retroactive fine for the previous calendar week.
//!
//! Every required kind missing on a qualifying day of last week costs a flat
//! rate. A qualifying day is a weekday (Monday to Friday) on or after the
//! program start. Holidays are *not* excluded here, only in the calendar.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::submission::{RequiredSet, SubmissionHistory, SubmissionKind};

/// Default penalty per missing required submission.
pub const DEFAULT_FINE_PER_MISS: u64 = 10_000;

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Program-wide fine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinePolicy {
  /// No obligation (and no fine) before this date.
  pub program_start: NaiveDate,
  pub per_miss:      u64,
}

impl FinePolicy {
  pub fn new(program_start: NaiveDate) -> Self {
    Self { program_start, per_miss: DEFAULT_FINE_PER_MISS }
  }

  /// Build the itemised report for the week before `evaluation_date`.
  ///
  /// `column_track` is the participant's flag *at evaluation time*. Returns
  /// `None` when that week falls outside the representable date range.
  pub fn report(
    &self,
    history: &SubmissionHistory,
    column_track: bool,
    evaluation_date: NaiveDate,
  ) -> Option<FineReport> {
    let week = Week::previous(evaluation_date)?;
    let required = RequiredSet::new(column_track);

    let days: Vec<DayMisses> = week
      .days()
      .filter(|d| is_weekday(*d))
      .filter(|d| *d >= self.program_start)
      .map(|date| DayMisses {
        date,
        missing: required.missing(&history.kinds_on(date)),
      })
      .collect();

    let total_misses: u64 = days.iter().map(|d| d.missing.len() as u64).sum();

    Some(FineReport {
      week_start: week.start,
      week_end: week.end(),
      required_per_day: required.len(),
      per_miss: self.per_miss,
      amount: total_misses.saturating_mul(self.per_miss),
      total_misses,
      days,
    })
  }

  pub fn amount(
    &self,
    history: &SubmissionHistory,
    column_track: bool,
    evaluation_date: NaiveDate,
  ) -> Option<u64> {
    self.report(history, column_track, evaluation_date).map(|r| r.amount)
  }
}

/// Fine owed for the week before `evaluation_date` at the default rate.
/// `None` when that week is outside the representable date range.
pub fn compute_fine(
  history: &SubmissionHistory,
  column_track: bool,
  program_start: NaiveDate,
  evaluation_date: NaiveDate,
) -> Option<u64> {
  FinePolicy::new(program_start).amount(history, column_track, evaluation_date)
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Required kinds missing on one qualifying day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMisses {
  pub date:    NaiveDate,
  pub missing: Vec<SubmissionKind>,
}

/// The itemised fine for one participant and one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineReport {
  /// Monday of the evaluated week.
  pub week_start:       NaiveDate,
  /// Sunday of the evaluated week.
  pub week_end:         NaiveDate,
  pub required_per_day: usize,
  pub per_miss:         u64,
  /// Qualifying days only; weekends and pre-start days are omitted.
  pub days:             Vec<DayMisses>,
  pub total_misses:     u64,
  pub amount:           u64,
}

// ─── Week arithmetic ─────────────────────────────────────────────────────────

/// A Monday-to-Sunday calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Week {
  pub start: NaiveDate,
}

impl Week {
  /// The week containing `date`, if all seven of its days are representable.
  pub fn containing(date: NaiveDate) -> Option<Self> {
    let offset = u64::from(date.weekday().num_days_from_monday());
    let start = date.checked_sub_days(Days::new(offset))?;
    start.checked_add_days(Days::new(6))?;
    Some(Self { start })
  }

  /// The week containing `date - 7 days`.
  pub fn previous(date: NaiveDate) -> Option<Self> {
    Self::containing(date.checked_sub_days(Days::new(7))?)
  }

  pub fn end(&self) -> NaiveDate { self.start + Days::new(6) }

  pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
    let start = self.start;
    (0..7).map(move |i| start + Days::new(i))
  }
}

pub fn is_weekday(date: NaiveDate) -> bool {
  !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
