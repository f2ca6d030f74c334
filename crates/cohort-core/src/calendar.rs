//! Calendar cell classification and month grids.
//!
//! A cell's state is recomputed from scratch for every render: it depends on
//! the submission count for the day, the participant's required count, and
//! where the day sits relative to today and to the program start.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::submission::{RequiredSet, SubmissionHistory};

// ─── States ──────────────────────────────────────────────────────────────────

/// How far a partially-complete day got, as a share of the required count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialBand {
  /// Under 26 %.
  Low,
  /// Under 51 %.
  Half,
  /// Under 76 %.
  Most,
  Nearly,
}

impl PartialBand {
  pub fn from_ratio(submitted: usize, required: usize) -> Self {
    let ratio = submitted as f64 / required.max(1) as f64;
    if ratio < 0.26 {
      Self::Low
    } else if ratio < 0.51 {
      Self::Half
    } else if ratio < 0.76 {
      Self::Most
    } else {
      Self::Nearly
    }
  }
}

/// Presentation state of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "band", rename_all = "snake_case")]
pub enum CellState {
  /// Before the program start; nothing can be logged.
  Locked,
  /// Every required kind was submitted.
  Complete,
  Partial(PartialBand),
  /// A past weekday with nothing submitted.
  Missing,
  /// Weekend or holiday with no obligation.
  RestDay,
  /// Today with nothing yet, or a future working day.
  Upcoming,
}

/// Everything the classifier looks at for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellInput {
  pub submitted:            usize,
  pub required:             usize,
  pub is_holiday:           bool,
  pub is_weekend:           bool,
  pub before_program_start: bool,
  pub is_today:             bool,
  pub is_future:            bool,
}

impl CellInput {
  /// Derive the positional flags for `date` as seen on `today`.
  pub fn at(
    date: NaiveDate,
    today: NaiveDate,
    program_start: NaiveDate,
    submitted: usize,
    required: usize,
    is_holiday: bool,
  ) -> Self {
    Self {
      submitted,
      required,
      is_holiday,
      is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
      before_program_start: date < program_start,
      is_today: date == today,
      is_future: date > today,
    }
  }
}

/// Classify one calendar cell. First matching rule wins.
pub fn classify(cell: &CellInput) -> CellState {
  if cell.before_program_start {
    return CellState::Locked;
  }
  if cell.submitted >= cell.required {
    return CellState::Complete;
  }
  if cell.is_today {
    return if cell.submitted == 0 {
      CellState::Upcoming
    } else {
      CellState::Partial(PartialBand::from_ratio(cell.submitted, cell.required))
    };
  }
  if cell.is_holiday || cell.is_weekend {
    return CellState::RestDay;
  }
  if cell.is_future {
    return CellState::Upcoming;
  }
  match cell.submitted {
    0 => CellState::Missing,
    n => CellState::Partial(PartialBand::from_ratio(n, cell.required)),
  }
}

// ─── Holidays ────────────────────────────────────────────────────────────────

/// Named public holidays, keyed by date. Supplied by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Holidays(BTreeMap<NaiveDate, String>);

impl Holidays {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, date: NaiveDate, name: impl Into<String>) {
    self.0.insert(date, name.into());
  }

  pub fn name(&self, date: NaiveDate) -> Option<&str> { self.0.get(&date).map(String::as_str) }

  pub fn contains(&self, date: NaiveDate) -> bool { self.0.contains_key(&date) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl FromIterator<(NaiveDate, String)> for Holidays {
  fn from_iter<I: IntoIterator<Item = (NaiveDate, String)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

// ─── Month grid ──────────────────────────────────────────────────────────────

/// One rendered day of a month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
  pub date:      NaiveDate,
  /// `false` for the padding days of the neighbouring months.
  pub in_month:  bool,
  pub submitted: usize,
  pub holiday:   Option<String>,
  #[serde(flatten)]
  pub state:     CellState,
}

/// A Sunday-first month view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthGrid {
  pub year:     i32,
  pub month:    u32,
  pub required: usize,
  /// Whole weeks, Sunday to Saturday, covering the month.
  pub weeks:    Vec<Vec<CalendarDay>>,
}

/// Inputs shared by every cell of a month grid.
#[derive(Debug, Clone, Copy)]
pub struct GridContext<'a> {
  pub history:       &'a SubmissionHistory,
  pub required:      RequiredSet,
  pub holidays:      &'a Holidays,
  pub program_start: NaiveDate,
  pub today:         NaiveDate,
}

/// Build the month grid for `year`/`month`. Returns `None` for an invalid
/// month, or one whose padded grid leaves the representable date range.
pub fn month_grid(year: i32, month: u32, ctx: &GridContext<'_>) -> Option<MonthGrid> {
  let first = NaiveDate::from_ymd_opt(year, month, 1)?;
  let last = first.checked_add_months(Months::new(1))?.pred_opt()?;

  let lead = u64::from(first.weekday().num_days_from_sunday());
  let trail = u64::from(6 - last.weekday().num_days_from_sunday());
  let grid_start = first.checked_sub_days(Days::new(lead))?;
  let grid_end = last.checked_add_days(Days::new(trail))?;

  let required = ctx.required.len();
  let days: Vec<CalendarDay> = grid_start
    .iter_days()
    .take_while(|d| *d <= grid_end)
    .map(|date| {
      let submitted = ctx.history.count_on(date);
      let holiday = ctx.holidays.name(date).map(str::to_owned);
      let input = CellInput::at(
        date,
        ctx.today,
        ctx.program_start,
        submitted,
        required,
        holiday.is_some(),
      );
      CalendarDay {
        date,
        in_month: date.month() == month && date.year() == year,
        submitted,
        holiday,
        state: classify(&input),
      }
    })
    .collect();

  Some(MonthGrid {
    year,
    month,
    required,
    weeks: days.chunks(7).map(<[CalendarDay]>::to_vec).collect(),
  })
}
