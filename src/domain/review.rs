use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::{CardSchedule, CardState, ScheduleError};

/// The learner's judgement of recall quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
  Again = 1,
  Hard = 2,
  Good = 3,
  Easy = 4,
}

impl Rating {
  pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

  pub fn from_u8(value: u8) -> Option<Self> {
    match value {
      1 => Some(Self::Again),
      2 => Some(Self::Hard),
      3 => Some(Self::Good),
      4 => Some(Self::Easy),
      _ => None,
    }
  }

  /// Good and Easy count as remembered for session statistics
  pub fn is_correct(&self) -> bool {
    matches!(self, Self::Good | Self::Easy)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Again => "Again",
      Self::Hard => "Hard",
      Self::Good => "Good",
      Self::Easy => "Easy",
    }
  }
}

impl TryFrom<u8> for Rating {
  type Error = ScheduleError;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Self::from_u8(value).ok_or(ScheduleError::InvalidRating(value))
  }
}

impl From<Rating> for u8 {
  fn from(rating: Rating) -> u8 {
    rating as u8
  }
}

impl std::fmt::Display for Rating {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One applied review, as written to `review_logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
  pub id: i64,
  pub flashcard_id: i64,
  pub user_id: String,
  pub rating: Rating,
  pub reviewed_at: DateTime<Utc>,
  /// Advisory only, never feeds the scheduler
  pub review_duration_secs: u32,
  pub state_before: CardState,
  pub state_after: CardState,
  pub stability: f64,
  pub difficulty: f64,
  pub due_at: Option<DateTime<Utc>>,
}

impl ReviewLog {
  pub fn new(
    flashcard_id: i64,
    user_id: &str,
    rating: Rating,
    review_duration_secs: u32,
    before: &CardSchedule,
    after: &CardSchedule,
  ) -> Self {
    Self {
      id: 0,
      flashcard_id,
      user_id: user_id.to_string(),
      rating,
      reviewed_at: after.last_reviewed_at.unwrap_or_else(Utc::now),
      review_duration_secs,
      state_before: before.state,
      state_after: after.state,
      stability: after.stability,
      difficulty: after.difficulty,
      due_at: after.due_at,
    }
  }
}

/// Running totals for one review session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
  pub total_cards: u32,
  pub reviewed_cards: u32,
  pub correct_answers: u32,
  pub incorrect_answers: u32,
  pub average_rating: f64,
}

impl SessionStats {
  pub fn new(total_cards: u32) -> Self {
    Self {
      total_cards,
      ..Self::default()
    }
  }

  pub fn record(&mut self, rating: Rating) {
    let previous = self.reviewed_cards as f64;
    self.average_rating = (self.average_rating * previous + u8::from(rating) as f64) / (previous + 1.0);
    self.reviewed_cards += 1;
    if rating.is_correct() {
      self.correct_answers += 1;
    } else {
      self.incorrect_answers += 1;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rating_from_u8() {
    assert_eq!(Rating::from_u8(1), Some(Rating::Again));
    assert_eq!(Rating::from_u8(2), Some(Rating::Hard));
    assert_eq!(Rating::from_u8(3), Some(Rating::Good));
    assert_eq!(Rating::from_u8(4), Some(Rating::Easy));
  }

  #[test]
  fn test_rating_rejects_out_of_range() {
    assert_eq!(Rating::from_u8(0), None);
    assert_eq!(Rating::from_u8(5), None);
    assert_eq!(Rating::try_from(9), Err(ScheduleError::InvalidRating(9)));
  }

  #[test]
  fn test_rating_ordering() {
    assert!(Rating::Again < Rating::Hard);
    assert!(Rating::Hard < Rating::Good);
    assert!(Rating::Good < Rating::Easy);
  }

  #[test]
  fn test_rating_serde_as_number() {
    let rating: Rating = serde_json::from_str("3").unwrap();
    assert_eq!(rating, Rating::Good);
    assert_eq!(serde_json::to_string(&Rating::Easy).unwrap(), "4");
    assert!(serde_json::from_str::<Rating>("7").is_err());
  }

  #[test]
  fn test_rating_is_correct() {
    assert!(!Rating::Again.is_correct());
    assert!(!Rating::Hard.is_correct());
    assert!(Rating::Good.is_correct());
    assert!(Rating::Easy.is_correct());
  }

  #[test]
  fn test_session_stats_record() {
    let mut stats = SessionStats::new(3);
    stats.record(Rating::Good);
    stats.record(Rating::Again);
    assert_eq!(stats.reviewed_cards, 2);
    assert_eq!(stats.correct_answers, 1);
    assert_eq!(stats.incorrect_answers, 1);
    assert!((stats.average_rating - 2.0).abs() < f64::EPSILON);

    stats.record(Rating::Easy);
    assert_eq!(stats.reviewed_cards, stats.total_cards);
    assert!((stats.average_rating - 8.0 / 3.0).abs() < 1e-9);
  }

  #[test]
  fn test_review_log_captures_transition() {
    let now = Utc::now();
    let before = CardSchedule::new(now);
    let mut after = before.clone();
    after.state = CardState::Learning;
    after.repetitions = 1;
    after.stability = 2.3;
    after.last_reviewed_at = Some(now);

    let log = ReviewLog::new(7, "alice", Rating::Good, 12, &before, &after);
    assert_eq!(log.flashcard_id, 7);
    assert_eq!(log.user_id, "alice");
    assert_eq!(log.state_before, CardState::New);
    assert_eq!(log.state_after, CardState::Learning);
    assert_eq!(log.reviewed_at, now);
    assert_eq!(log.review_duration_secs, 12);
  }
}
