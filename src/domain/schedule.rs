use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty given to a freshly authored card (midpoint of the FSRS scale)
pub const INITIAL_DIFFICULTY: f64 = 5.0;

/// Lower bound of the FSRS difficulty scale
pub const MIN_DIFFICULTY: f64 = 1.0;

/// Upper bound of the FSRS difficulty scale
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Lifecycle stage of a card's memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
  New,
  Learning,
  Review,
  Relearning,
}

impl CardState {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "New" => Some(Self::New),
      "Learning" => Some(Self::Learning),
      "Review" => Some(Self::Review),
      "Relearning" => Some(Self::Relearning),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::New => "New",
      Self::Learning => "Learning",
      Self::Review => "Review",
      Self::Relearning => "Relearning",
    }
  }

  /// True once the card has graduated out of the learning phase at least once
  pub fn is_learned(&self) -> bool {
    matches!(self, Self::Review | Self::Relearning)
  }
}

/// Contract violations detected by the scheduling engine.
///
/// These are programming errors: a caller receiving one has handed the
/// engine a schedule it could never have produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
  #[error("invalid rating value {0}, expected 1..=4")]
  InvalidRating(u8),
  #[error("stability must be non-negative, got {0}")]
  NegativeStability(f64),
  #[error("difficulty {0} is outside the FSRS range")]
  DifficultyOutOfRange(f64),
  #[error("state {state:?} is inconsistent with {repetitions} repetitions")]
  InconsistentState { state: CardState, repetitions: u32 },
  #[error("FSRS computation failed: {0}")]
  Fsrs(String),
}

/// Spaced-repetition state of one flashcard for its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSchedule {
  pub difficulty: f64,
  /// Memory stability in days, 0 before the first review
  pub stability: f64,
  pub repetitions: u32,
  pub lapses: u32,
  pub state: CardState,
  /// None means due immediately
  pub due_at: Option<DateTime<Utc>>,
  pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl CardSchedule {
  /// Schedule for a card authored at `now`: never reviewed and due at once.
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      difficulty: INITIAL_DIFFICULTY,
      stability: 0.0,
      repetitions: 0,
      lapses: 0,
      state: CardState::New,
      due_at: Some(now),
      last_reviewed_at: None,
    }
  }

  /// Check the model invariants.
  pub fn validate(&self) -> Result<(), ScheduleError> {
    if self.stability.is_nan() || self.stability < 0.0 {
      return Err(ScheduleError::NegativeStability(self.stability));
    }
    if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
      return Err(ScheduleError::DifficultyOutOfRange(self.difficulty));
    }
    let never_reviewed = self.repetitions == 0;
    if never_reviewed != (self.state == CardState::New) {
      return Err(ScheduleError::InconsistentState {
        state: self.state,
        repetitions: self.repetitions,
      });
    }
    Ok(())
  }
}
