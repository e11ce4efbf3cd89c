pub mod events;
pub mod flashcards;
pub mod repository;
pub mod reviews;
pub mod schema;
pub mod source_texts;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Re-export all public items from submodules
pub use events::*;
pub use flashcards::*;
pub use repository::{MemoryScheduleStore, ScheduleStore, SqliteScheduleStore};
pub use reviews::*;
pub use schema::run_migrations;
pub use source_texts::*;

pub type DbPool = Arc<Mutex<Connection>>;

/// Failures of the persistence collaborator
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("flashcard {0} not found")]
    NotFound(i64),
    /// The persisted schedule moved on since it was loaded
    #[error("schedule of flashcard {0} was updated by another review")]
    StaleSchedule(i64),
    #[error(transparent)]
    Lock(#[from] DbLockError),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database unavailable")
    }
}

impl std::error::Error for DbLockError {}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
    pool.lock().map_err(|_: PoisonError<_>| {
        tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
        DbLockError
    })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    // Create backup before migrations if database exists
    if path.exists() {
        let backup_path = path.with_extension("db.backup");
        if let Err(e) = std::fs::copy(path, &backup_path) {
            tracing::warn!("Could not create database backup: {}", e);
        }
    }

    let conn = Connection::open(path)?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_ts(idx: usize, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

pub(crate) fn parse_opt_ts(idx: usize, value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(idx, &v)).transpose()
}
