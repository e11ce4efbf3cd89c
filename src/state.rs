//! Application state shared by all handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::{FlashcardGenerator, PlaceholderGenerator};
use crate::srs::Scheduler;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Flashcards, source texts, review and event logs
    pub db: DbPool,

    pub scheduler: Arc<Scheduler>,

    /// Turns source text into candidate cards
    pub generator: Arc<dyn FlashcardGenerator>,
}

impl AppState {
    pub fn new(db: DbPool, config: &AppConfig) -> Self {
        Self {
            db,
            scheduler: Arc::new(Scheduler::new(&config.scheduler)),
            generator: Arc::new(PlaceholderGenerator),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn FlashcardGenerator>) -> Self {
        self.generator = generator;
        self
    }
}
