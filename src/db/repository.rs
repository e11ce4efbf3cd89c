//! Schedule persistence seam used by the review service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::CardSchedule;

use super::flashcards::row_to_schedule;
use super::{format_ts, StoreError};

/// Load and save card schedules for one user.
pub trait ScheduleStore {
  fn load_schedule(&self, flashcard_id: i64) -> Result<CardSchedule, StoreError>;

  /// Persist `schedule` unless the stored `last_reviewed_at` differs from
  /// `expected_last_reviewed_at`.
  fn save_schedule(
    &mut self,
    flashcard_id: i64,
    expected_last_reviewed_at: Option<DateTime<Utc>>,
    schedule: &CardSchedule,
  ) -> Result<(), StoreError>;
}

/// Schedules stored in the `flashcards` table
pub struct SqliteScheduleStore<'a> {
  conn: &'a Connection,
  user_id: &'a str,
}

impl<'a> SqliteScheduleStore<'a> {
  pub fn new(conn: &'a Connection, user_id: &'a str) -> Self {
    Self { conn, user_id }
  }
}

impl ScheduleStore for SqliteScheduleStore<'_> {
  fn load_schedule(&self, flashcard_id: i64) -> Result<CardSchedule, StoreError> {
    self
      .conn
      .query_row(
        r#"
        SELECT difficulty, stability, repetitions, lapses, state, due_at, last_reviewed_at
        FROM flashcards WHERE id = ?1 AND user_id = ?2
        "#,
        params![flashcard_id, self.user_id],
        |row| row_to_schedule(row, 0),
      )
      .optional()?
      .ok_or(StoreError::NotFound(flashcard_id))
  }

  fn save_schedule(
    &mut self,
    flashcard_id: i64,
    expected_last_reviewed_at: Option<DateTime<Utc>>,
    schedule: &CardSchedule,
  ) -> Result<(), StoreError> {
    // IS compares NULL to NULL as equal
    let updated = self.conn.execute(
      r#"
      UPDATE flashcards
      SET difficulty = ?1, stability = ?2, repetitions = ?3, lapses = ?4, state = ?5,
          due_at = ?6, last_reviewed_at = ?7
      WHERE id = ?8 AND user_id = ?9 AND last_reviewed_at IS ?10
      "#,
      params![
        schedule.difficulty,
        schedule.stability,
        schedule.repetitions,
        schedule.lapses,
        schedule.state.as_str(),
        schedule.due_at.map(format_ts),
        schedule.last_reviewed_at.map(format_ts),
        flashcard_id,
        self.user_id,
        expected_last_reviewed_at.map(format_ts),
      ],
    )?;

    if updated > 0 {
      return Ok(());
    }

    // Nothing matched: tell a missing card apart from a lost race
    let exists = self
      .conn
      .query_row(
        "SELECT 1 FROM flashcards WHERE id = ?1 AND user_id = ?2",
        params![flashcard_id, self.user_id],
        |_| Ok(()),
      )
      .optional()?
      .is_some();

    if exists {
      Err(StoreError::StaleSchedule(flashcard_id))
    } else {
      Err(StoreError::NotFound(flashcard_id))
    }
  }
}

/// Schedules held in memory, for tests and tools
#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
  schedules: HashMap<i64, CardSchedule>,
}

impl MemoryScheduleStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, flashcard_id: i64, schedule: CardSchedule) {
    self.schedules.insert(flashcard_id, schedule);
  }
}

impl ScheduleStore for MemoryScheduleStore {
  fn load_schedule(&self, flashcard_id: i64) -> Result<CardSchedule, StoreError> {
    self
      .schedules
      .get(&flashcard_id)
      .cloned()
      .ok_or(StoreError::NotFound(flashcard_id))
  }

  fn save_schedule(
    &mut self,
    flashcard_id: i64,
    expected_last_reviewed_at: Option<DateTime<Utc>>,
    schedule: &CardSchedule,
  ) -> Result<(), StoreError> {
    let stored = self
      .schedules
      .get_mut(&flashcard_id)
      .ok_or(StoreError::NotFound(flashcard_id))?;
    if stored.last_reviewed_at != expected_last_reviewed_at {
      return Err(StoreError::StaleSchedule(flashcard_id));
    }
    *stored = schedule.clone();
    Ok(())
  }
}
