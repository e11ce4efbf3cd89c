//! Read-only views over a card schedule: due-ness, learning progress,
//! knowledge level and a human-scaled time until the next review.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::schedule::{INITIAL_DIFFICULTY, MIN_DIFFICULTY};
use crate::domain::CardSchedule;

/// Repetitions that earn full repetition credit; also the upper bound of
/// the `Good` knowledge level
pub const MASTERY_REPETITIONS: u32 = 10;

/// Upper repetition bound of the `Learning` knowledge level
pub const LEARNING_MAX_REPETITIONS: u32 = 2;

/// Upper repetition bound of the `Known` knowledge level
pub const KNOWN_MAX_REPETITIONS: u32 = 5;

const REPETITION_WEIGHT: f64 = 0.7;
const DIFFICULTY_WEIGHT: f64 = 0.3;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const DAYS_PER_WEEK: i64 = 7;
const DAYS_PER_MONTH: i64 = 30;

/// True when the card has no due date or the due date has arrived.
pub fn is_due(schedule: &CardSchedule, now: DateTime<Utc>) -> bool {
  schedule.due_at.is_none_or(|due_at| now >= due_at)
}

/// Learning progress in percent.
///
/// 70% comes from repetitions (saturating at `MASTERY_REPETITIONS`), 30%
/// from how far difficulty has dropped below its initial value.
pub fn progress_percent(schedule: &CardSchedule) -> u8 {
  let repetition_credit = (schedule.repetitions as f64 / MASTERY_REPETITIONS as f64).min(1.0);
  let difficulty_credit = ((INITIAL_DIFFICULTY - schedule.difficulty)
    / (INITIAL_DIFFICULTY - MIN_DIFFICULTY))
    .clamp(0.0, 1.0);

  let percent =
    (repetition_credit * REPETITION_WEIGHT + difficulty_credit * DIFFICULTY_WEIGHT) * 100.0;
  if percent.is_nan() {
    return 0;
  }
  percent.round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum KnowledgeLevel {
  New,
  Learning,
  Known,
  Good,
  Mastered,
}

impl KnowledgeLevel {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::New => "New",
      Self::Learning => "Learning",
      Self::Known => "Known",
      Self::Good => "Good",
      Self::Mastered => "Mastered",
    }
  }
}

impl std::fmt::Display for KnowledgeLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

pub fn knowledge_level(schedule: &CardSchedule) -> KnowledgeLevel {
  match schedule.repetitions {
    0 => KnowledgeLevel::New,
    n if n <= LEARNING_MAX_REPETITIONS => KnowledgeLevel::Learning,
    n if n <= KNOWN_MAX_REPETITIONS => KnowledgeLevel::Known,
    n if n <= MASTERY_REPETITIONS => KnowledgeLevel::Good,
    _ => KnowledgeLevel::Mastered,
  }
}

/// Bucketed time until a card is next due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "count", rename_all = "camelCase")]
pub enum DueIn {
  Now,
  Tomorrow,
  Days(i64),
  Weeks(i64),
  Months(i64),
}

impl std::fmt::Display for DueIn {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Now => write!(f, "ready now"),
      Self::Tomorrow => write!(f, "tomorrow"),
      Self::Days(n) => write!(f, "in {} day{}", n, plural(*n)),
      Self::Weeks(n) => write!(f, "in {} week{}", n, plural(*n)),
      Self::Months(n) => write!(f, "in {} month{}", n, plural(*n)),
    }
  }
}

fn plural(n: i64) -> &'static str {
  if n == 1 { "" } else { "s" }
}

/// Day/week/month buckets, each rounded up.
pub fn time_until_due(schedule: &CardSchedule, now: DateTime<Utc>) -> DueIn {
  let due_at = match schedule.due_at {
    Some(due_at) if now < due_at => due_at,
    _ => return DueIn::Now,
  };

  let millis = (due_at - now).num_milliseconds();
  let days = ceil_div(millis, MILLIS_PER_DAY);

  if days <= 1 {
    DueIn::Tomorrow
  } else if days < DAYS_PER_WEEK {
    DueIn::Days(days)
  } else if days < DAYS_PER_MONTH {
    DueIn::Weeks(ceil_div(days, DAYS_PER_WEEK))
  } else {
    DueIn::Months(ceil_div(days, DAYS_PER_MONTH))
  }
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
  (numerator + denominator - 1) / denominator
}
