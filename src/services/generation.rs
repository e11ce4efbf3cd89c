//! Flashcard generation from source text.
//!
//! The generator is a collaborator behind a trait so a model-backed
//! implementation can replace the placeholder without touching handlers.

use serde::Serialize;

use crate::config::{MAX_BACK_CHARS, MAX_SOURCE_TEXT_CHARS};

/// A generated card before it is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateCard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("source text is empty")]
    EmptyText,
    #[error("source text is too long")]
    TextTooLong,
    #[error("generation failed: {0}")]
    Provider(String),
}

pub trait FlashcardGenerator: Send + Sync {
    fn generate(&self, text: &str) -> Result<Vec<CandidateCard>, GenerationError>;
}

/// Offline generator producing a fixed set of questions about the text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderGenerator;

impl FlashcardGenerator for PlaceholderGenerator {
    fn generate(&self, text: &str) -> Result<Vec<CandidateCard>, GenerationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyText);
        }
        if text.chars().count() > MAX_SOURCE_TEXT_CHARS {
            return Err(GenerationError::TextTooLong);
        }

        let first_sentence = text
            .split_terminator(['.', '!', '?', '\n'])
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(text);
        let word_count = text.split_whitespace().count();

        let cards = vec![
            CandidateCard {
                front: "What is the main topic of this text?".to_string(),
                back: truncate_chars(first_sentence, MAX_BACK_CHARS),
            },
            CandidateCard {
                front: "What are the key points mentioned?".to_string(),
                back: truncate_chars(text, MAX_BACK_CHARS),
            },
            CandidateCard {
                front: "How long is the source text?".to_string(),
                back: format!("{} words", word_count),
            },
        ];
        tracing::debug!(count = cards.len(), "Generated placeholder flashcards");
        Ok(cards)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
