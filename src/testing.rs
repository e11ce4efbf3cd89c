//! Test utilities for database and server setup.
//!
//! Reuses the production initialization path so tests run against the
//! same schema the server migrates to.

use axum::http::{HeaderName, HeaderValue};
use chrono::Utc;
use std::path::Path;
use tempfile::TempDir;

use crate::auth::USER_ID_HEADER;
use crate::config::AppConfig;
use crate::db;
use crate::domain::{Flashcard, FlashcardSource};
use crate::state::AppState;

/// On-disk database in a temporary directory plus the app state around it.
///
/// The directory is removed when the environment is dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    pub state: AppState,
}

impl TestEnv {
    /// Create a test environment with an empty, fully migrated database.
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let pool = db::init_db(&temp.path().join("flashdeck.db"))?;
        let state = AppState::new(pool, &AppConfig::default());
        Ok(Self { temp, state })
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Store a card for `user_id` and return it with its id.
    pub fn insert_card(&self, user_id: &str, source: FlashcardSource) -> rusqlite::Result<Flashcard> {
        let conn = db::try_lock(&self.state.db)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let mut card = Flashcard::new(
            user_id,
            "What is ownership?".to_string(),
            "Each value has a single owner".to_string(),
            source,
            None,
            Utc::now(),
        );
        card.id = db::insert_flashcard(&conn, &card)?;
        Ok(card)
    }

    pub fn user_header() -> HeaderName {
        HeaderName::from_static(USER_ID_HEADER)
    }

    pub fn user_value(user_id: &'static str) -> HeaderValue {
        HeaderValue::from_static(user_id)
    }

    /// HTTP test server over the full router.
    #[cfg(test)]
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::new(crate::handlers::router(self.state.clone()))
            .expect("Failed to start test server")
    }
}
