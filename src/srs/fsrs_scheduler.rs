use chrono::{DateTime, Duration, Utc};
use fsrs::{MemoryState, FSRS, DEFAULT_PARAMETERS};

use crate::config::SchedulerConfig;
use crate::domain::schedule::{MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::domain::{CardSchedule, CardState, Rating, ScheduleError};

/// Repetition count at which a learning card graduates to Review
pub const GRADUATING_REPETITIONS: u32 = 4;

/// Stability (days) a relearning card must regain to return to Review
pub const RELEARNED_STABILITY_DAYS: f64 = 1.0;

/// Again never pushes a card further out than this
const MAX_AGAIN_DELAY_MINUTES: i64 = 24 * 60;

const DEFAULT_RETENTION: f32 = 0.9;

/// Pure FSRS-backed review scheduler.
///
/// Holds only tunables; every call builds its own `FSRS` instance, so a
/// `Scheduler` can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct Scheduler {
  desired_retention: f32,
  again_delay: Duration,
  maximum_interval_days: i64,
}

impl Default for Scheduler {
  fn default() -> Self {
    Self::new(&SchedulerConfig::default())
  }
}

impl Scheduler {
  pub fn new(config: &SchedulerConfig) -> Self {
    let again_minutes = config.again_delay_minutes.clamp(1, MAX_AGAIN_DELAY_MINUTES);
    let retention = if config.desired_retention.is_finite() {
      (config.desired_retention as f32).clamp(0.7, 0.99)
    } else {
      tracing::warn!("desired_retention {} is not a number, using {}", config.desired_retention, DEFAULT_RETENTION);
      DEFAULT_RETENTION
    };
    Self {
      desired_retention: retention,
      again_delay: Duration::minutes(again_minutes),
      maximum_interval_days: config.maximum_interval_days.max(1),
    }
  }

  /// Compute the schedule that follows `current` after a review rated
  /// `rating` at `now`.
  ///
  /// The input is never modified. `review_duration_secs` is recorded for
  /// diagnostics only and has no effect on the result.
  pub fn schedule_next_review(
    &self,
    current: &CardSchedule,
    rating: Rating,
    review_duration_secs: u32,
    now: DateTime<Utc>,
  ) -> Result<CardSchedule, ScheduleError> {
    current.validate()?;

    let elapsed = elapsed_days(current, now);
    let fsrs = FSRS::new(Some(&DEFAULT_PARAMETERS))
      .map_err(|e| ScheduleError::Fsrs(format!("{e:?}")))?;
    let next_states = fsrs
      .next_states(memory_state(current), self.desired_retention, elapsed)
      .map_err(|e| ScheduleError::Fsrs(format!("{e:?}")))?;

    let scheduled = match rating {
      Rating::Again => &next_states.again,
      Rating::Hard => &next_states.hard,
      Rating::Good => &next_states.good,
      Rating::Easy => &next_states.easy,
    };

    let stability = (scheduled.memory.stability as f64).max(0.0);
    let difficulty = (scheduled.memory.difficulty as f64).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    let repetitions = current.repetitions.saturating_add(1);
    let state = next_state(current.state, rating, repetitions, stability);

    let lapses = if rating == Rating::Again && current.state.is_learned() {
      current.lapses.saturating_add(1)
    } else {
      current.lapses
    };

    let due_at = match rating {
      Rating::Again => now + self.again_delay,
      _ => {
        let days = (scheduled.interval as f64)
          .round()
          .clamp(1.0, self.maximum_interval_days as f64) as i64;
        now + Duration::days(days)
      }
    };

    let next = CardSchedule {
      difficulty,
      stability,
      repetitions,
      lapses,
      state,
      due_at: Some(due_at),
      last_reviewed_at: Some(now),
    };
    debug_assert!(next.validate().is_ok(), "scheduler produced invalid schedule: {next:?}");

    tracing::trace!(
      rating = %rating,
      elapsed_days = elapsed,
      review_duration_secs,
      from = current.state.as_str(),
      to = next.state.as_str(),
      stability = next.stability,
      "scheduled next review"
    );

    Ok(next)
  }
}

/// `Scheduler::default().schedule_next_review(..)`
pub fn schedule_next_review(
  current: &CardSchedule,
  rating: Rating,
  review_duration_secs: u32,
  now: DateTime<Utc>,
) -> Result<CardSchedule, ScheduleError> {
  Scheduler::default().schedule_next_review(current, rating, review_duration_secs, now)
}

/// Whole days since the last review; a never-reviewed card counts from its
/// authoring instant, which is its initial due date.
fn elapsed_days(current: &CardSchedule, now: DateTime<Utc>) -> u32 {
  current
    .last_reviewed_at
    .or(current.due_at)
    .map(|since| (now - since).num_days().clamp(0, u32::MAX as i64) as u32)
    .unwrap_or(0)
}

fn memory_state(current: &CardSchedule) -> Option<MemoryState> {
  if current.state == CardState::New || current.stability <= 0.0 {
    return None;
  }
  Some(MemoryState {
    stability: current.stability as f32,
    difficulty: current.difficulty as f32,
  })
}

fn next_state(previous: CardState, rating: Rating, repetitions: u32, stability: f64) -> CardState {
  let recalled = rating != Rating::Again;
  match (previous, recalled) {
    (CardState::New, _) => CardState::Learning,
    (CardState::Learning, true) if repetitions >= GRADUATING_REPETITIONS => CardState::Review,
    (CardState::Learning, _) => CardState::Learning,
    (CardState::Review, true) => CardState::Review,
    (CardState::Review, false) => CardState::Relearning,
    (CardState::Relearning, true) if stability >= RELEARNED_STABILITY_DAYS => CardState::Review,
    (CardState::Relearning, _) => CardState::Relearning,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::Rng;

  fn review_card(now: DateTime<Utc>) -> CardSchedule {
    CardSchedule {
      difficulty: 5.0,
      stability: 10.0,
      repetitions: 6,
      lapses: 0,
      state: CardState::Review,
      due_at: Some(now),
      last_reviewed_at: Some(now - Duration::days(10)),
    }
  }

  #[test]
  fn test_first_good_review_enters_learning() {
    let now = Utc::now();
    let new = CardSchedule::new(now);

    let next = schedule_next_review(&new, Rating::Good, 5, now).unwrap();

    assert_eq!(next.repetitions, 1);
    assert_eq!(next.state, CardState::Learning);
    assert!(next.due_at.unwrap() > now);
    assert!(next.stability > 0.0);
    assert_eq!(next.last_reviewed_at, Some(now));
  }

  #[test]
  fn test_four_good_reviews_graduate() {
    let mut now = Utc::now();
    let mut schedule = CardSchedule::new(now);

    for expected_reps in 1..=4 {
      schedule = schedule_next_review(&schedule, Rating::Good, 5, now).unwrap();
      assert_eq!(schedule.repetitions, expected_reps);
      if expected_reps < GRADUATING_REPETITIONS {
        assert_eq!(schedule.state, CardState::Learning);
      }
      now = schedule.due_at.unwrap();
    }

    assert_eq!(schedule.state, CardState::Review);
    assert_eq!(schedule.repetitions, 4);
    assert_eq!(schedule.lapses, 0);
  }

  #[test]
  fn test_again_on_review_card_lapses() {
    let now = Utc::now();
    let current = review_card(now);

    let next = schedule_next_review(&current, Rating::Again, 3, now).unwrap();

    assert_eq!(next.state, CardState::Relearning);
    assert_eq!(next.lapses, 1);
    assert_eq!(next.repetitions, 7);
    let delay = next.due_at.unwrap() - now;
    assert!(delay > Duration::zero());
    assert!(delay < Duration::days(1));
    assert!(next.stability < current.stability);
  }

  #[test]
  fn test_again_on_learning_card_is_not_a_lapse() {
    let now = Utc::now();
    let learning = schedule_next_review(&CardSchedule::new(now), Rating::Good, 0, now).unwrap();

    let next = schedule_next_review(&learning, Rating::Again, 0, now).unwrap();

    assert_eq!(next.state, CardState::Learning);
    assert_eq!(next.lapses, 0);
    assert_eq!(next.repetitions, 2);
  }

  #[test]
  fn test_again_on_new_card_enters_learning() {
    let now = Utc::now();
    let next = schedule_next_review(&CardSchedule::new(now), Rating::Again, 0, now).unwrap();

    assert_eq!(next.state, CardState::Learning);
    assert_eq!(next.repetitions, 1);
    assert_eq!(next.lapses, 0);
    assert!(next.due_at.unwrap() - now < Duration::days(1));
  }

  #[test]
  fn test_again_while_relearning_counts_another_lapse() {
    let now = Utc::now();
    let relearning = schedule_next_review(&review_card(now), Rating::Again, 0, now).unwrap();

    let next = schedule_next_review(&relearning, Rating::Again, 0, now).unwrap();

    assert_eq!(next.state, CardState::Relearning);
    assert_eq!(next.lapses, 2);
  }

  #[test]
  fn test_relearning_recovers_to_review() {
    let now = Utc::now();
    let relearning = CardSchedule {
      difficulty: 6.0,
      stability: 2.0,
      repetitions: 8,
      lapses: 1,
      state: CardState::Relearning,
      due_at: Some(now - Duration::days(2)),
      last_reviewed_at: Some(now - Duration::days(3)),
    };

    let next = schedule_next_review(&relearning, Rating::Good, 0, now).unwrap();

    assert!(next.stability >= RELEARNED_STABILITY_DAYS);
    assert_eq!(next.state, CardState::Review);
    assert_eq!(next.lapses, 1);
  }

  #[test]
  fn test_relearning_below_threshold_stays_relearning() {
    let now = Utc::now();
    let relearning = CardSchedule {
      difficulty: 7.0,
      stability: 0.05,
      repetitions: 8,
      lapses: 1,
      state: CardState::Relearning,
      due_at: Some(now),
      last_reviewed_at: Some(now),
    };

    let next = schedule_next_review(&relearning, Rating::Good, 0, now).unwrap();

    assert!(next.stability < RELEARNED_STABILITY_DAYS);
    assert_eq!(next.state, CardState::Relearning);
  }

  #[test]
  fn test_stability_ordered_by_rating_for_new_card() {
    let now = Utc::now();
    let new = CardSchedule::new(now);
    let stability =
      |rating| schedule_next_review(&new, rating, 0, now).unwrap().stability;

    assert!(stability(Rating::Easy) >= stability(Rating::Good));
    assert!(stability(Rating::Good) >= stability(Rating::Hard));
  }

  #[test]
  fn test_stability_ordered_by_rating_for_review_card() {
    let now = Utc::now();
    let current = review_card(now);
    let results: Vec<CardSchedule> = Rating::ALL
      .iter()
      .map(|&rating| schedule_next_review(&current, rating, 0, now).unwrap())
      .collect();
    let (again, hard, good, easy) = (&results[0], &results[1], &results[2], &results[3]);

    assert!(easy.stability >= good.stability);
    assert!(good.stability >= hard.stability);
    assert!(again.due_at < hard.due_at);
    assert!(again.due_at < good.due_at);
    assert!(again.due_at < easy.due_at);
  }

  #[test]
  fn test_difficulty_moves_with_rating() {
    let now = Utc::now();
    let current = review_card(now);

    let again = schedule_next_review(&current, Rating::Again, 0, now).unwrap();
    let good = schedule_next_review(&current, Rating::Good, 0, now).unwrap();
    let easy = schedule_next_review(&current, Rating::Easy, 0, now).unwrap();

    assert!(again.difficulty > current.difficulty);
    assert!(easy.difficulty < current.difficulty);
    assert!((good.difficulty - current.difficulty).abs() < 0.5);
  }

  #[test]
  fn test_non_again_due_is_at_least_a_day_out() {
    let now = Utc::now();
    let new = CardSchedule::new(now);
    for rating in [Rating::Hard, Rating::Good, Rating::Easy] {
      let next = schedule_next_review(&new, rating, 0, now).unwrap();
      assert!(next.due_at.unwrap() - now >= Duration::days(1));
    }
  }

  #[test]
  fn test_input_is_not_modified() {
    let now = Utc::now();
    let current = review_card(now);
    let snapshot = current.clone();

    let _ = schedule_next_review(&current, Rating::Easy, 0, now).unwrap();

    assert_eq!(current, snapshot);
  }

  #[test]
  fn test_rejects_negative_stability() {
    let now = Utc::now();
    let mut current = review_card(now);
    current.stability = -2.0;

    let result = schedule_next_review(&current, Rating::Good, 0, now);

    assert_eq!(result, Err(ScheduleError::NegativeStability(-2.0)));
  }

  #[test]
  fn test_rejects_inconsistent_state() {
    let now = Utc::now();
    let mut current = CardSchedule::new(now);
    current.state = CardState::Review;

    assert!(matches!(
      schedule_next_review(&current, Rating::Good, 0, now),
      Err(ScheduleError::InconsistentState { .. })
    ));
  }

  #[test]
  fn test_random_ratings_preserve_invariants() {
    let mut rng = rand::rng();
    let mut now = Utc::now();
    let mut schedule = CardSchedule::new(now);

    for _ in 0..200 {
      let rating = Rating::from_u8(rng.random_range(1..=4)).unwrap();
      let next = schedule_next_review(&schedule, rating, rng.random_range(0..60), now).unwrap();

      assert!(next.stability >= 0.0);
      assert_eq!(next.repetitions, schedule.repetitions + 1);
      assert_ne!(next.state, CardState::New);
      assert!(next.validate().is_ok());

      schedule = next;
      now += Duration::hours(rng.random_range(0..24 * 20));
    }
  }

  #[test]
  fn test_elapsed_days_uses_last_review() {
    let now = Utc::now();
    let current = review_card(now);
    assert_eq!(elapsed_days(&current, now), 10);

    let new = CardSchedule::new(now - Duration::days(3));
    assert_eq!(elapsed_days(&new, now), 3);

    let mut future = CardSchedule::new(now + Duration::days(2));
    future.due_at = None;
    assert_eq!(elapsed_days(&future, now), 0);
  }

  #[test]
  fn test_state_transitions() {
    use CardState::*;
    assert_eq!(next_state(New, Rating::Good, 1, 3.0), Learning);
    assert_eq!(next_state(New, Rating::Again, 1, 0.2), Learning);
    assert_eq!(next_state(Learning, Rating::Good, 3, 8.0), Learning);
    assert_eq!(next_state(Learning, Rating::Hard, 4, 8.0), Review);
    assert_eq!(next_state(Learning, Rating::Again, 5, 0.3), Learning);
    assert_eq!(next_state(Review, Rating::Easy, 9, 30.0), Review);
    assert_eq!(next_state(Review, Rating::Again, 9, 0.5), Relearning);
    assert_eq!(next_state(Relearning, Rating::Good, 10, 0.8), Relearning);
    assert_eq!(next_state(Relearning, Rating::Good, 10, 1.2), Review);
  }

  #[test]
  fn test_again_delay_from_config() {
    let now = Utc::now();
    let scheduler = Scheduler::new(&SchedulerConfig {
      again_delay_minutes: 5,
      ..SchedulerConfig::default()
    });

    let next = scheduler
      .schedule_next_review(&review_card(now), Rating::Again, 0, now)
      .unwrap();

    assert_eq!(next.due_at, Some(now + Duration::minutes(5)));
  }

  #[test]
  fn test_maximum_interval_caps_due_date() {
    let now = Utc::now();
    let scheduler = Scheduler::new(&SchedulerConfig {
      maximum_interval_days: 3,
      ..SchedulerConfig::default()
    });
    let mut current = review_card(now);
    current.stability = 200.0;
    current.last_reviewed_at = Some(now - Duration::days(200));

    let next = scheduler
      .schedule_next_review(&current, Rating::Easy, 0, now)
      .unwrap();

    assert_eq!(next.due_at, Some(now + Duration::days(3)));
  }

  #[test]
  fn test_non_finite_retention_falls_back_to_default() {
    let now = Utc::now();
    for retention in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
      let scheduler = Scheduler::new(&SchedulerConfig {
        desired_retention: retention,
        ..SchedulerConfig::default()
      });
      assert_eq!(scheduler.desired_retention, DEFAULT_RETENTION);

      let next = scheduler
        .schedule_next_review(&CardSchedule::new(now), Rating::Good, 0, now)
        .unwrap();
      assert_eq!(next.state, CardState::Learning);
    }
  }
}
