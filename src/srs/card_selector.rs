//! Due-set construction for review sessions.
//!
//! The due set is ordered earliest `due_at` first; cards without a due date
//! sort before everything else. Ties keep their input order.

use chrono::{DateTime, Utc};

use crate::domain::{CardSchedule, Flashcard};

use super::progress::is_due;

/// Select the items whose schedule is due at `now`.
pub fn due_set_by<T, F>(items: impl IntoIterator<Item = T>, now: DateTime<Utc>, schedule_of: F) -> Vec<T>
where
  F: Fn(&T) -> &CardSchedule,
{
  let mut due: Vec<T> = items
    .into_iter()
    .filter(|item| is_due(schedule_of(item), now))
    .collect();
  // Option orders None before Some, and sort_by_key is stable
  due.sort_by_key(|item| schedule_of(item).due_at);
  due
}

/// Due flashcards for a review session.
pub fn due_set(cards: impl IntoIterator<Item = Flashcard>, now: DateTime<Utc>) -> Vec<Flashcard> {
  due_set_by(cards, now, |card| &card.schedule)
}

/// Earliest upcoming due date among cards that are not yet due
pub fn next_due_at<'a>(
  schedules: impl IntoIterator<Item = &'a CardSchedule>,
  now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
  schedules
    .into_iter()
    .filter(|schedule| !is_due(schedule, now))
    .filter_map(|schedule| schedule.due_at)
    .min()
}
