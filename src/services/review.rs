//! Applying a rating to a stored card.
//!
//! Loads the schedule, runs the scheduler, and saves the result with a
//! compare-and-set on `last_reviewed_at` so two concurrent reviews of the
//! same card cannot both win.

use chrono::{DateTime, Utc};

use crate::db::{ScheduleStore, StoreError};
use crate::domain::{CardSchedule, Rating, ScheduleError};
use crate::srs::Scheduler;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Schedules before and after one review
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub before: CardSchedule,
    pub after: CardSchedule,
}

pub fn apply_review<S: ScheduleStore + ?Sized>(
    store: &mut S,
    scheduler: &Scheduler,
    flashcard_id: i64,
    rating: Rating,
    review_duration_secs: u32,
    now: DateTime<Utc>,
) -> Result<ReviewOutcome, ReviewError> {
    let before = store.load_schedule(flashcard_id)?;
    let after = scheduler.schedule_next_review(&before, rating, review_duration_secs, now)?;
    store.save_schedule(flashcard_id, before.last_reviewed_at, &after)?;

    tracing::debug!(
        flashcard_id,
        rating = rating.as_str(),
        from = before.state.as_str(),
        to = after.state.as_str(),
        "Review applied"
    );
    Ok(ReviewOutcome { before, after })
}
