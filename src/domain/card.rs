use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::CardSchedule;

/// How a flashcard came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashcardSource {
  #[serde(rename = "ai")]
  Ai,
  #[serde(rename = "manual")]
  Manual,
  #[serde(rename = "ai-edited")]
  AiEdited,
}

impl FlashcardSource {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "ai" => Some(Self::Ai),
      "manual" => Some(Self::Manual),
      "ai-edited" => Some(Self::AiEdited),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Ai => "ai",
      Self::Manual => "manual",
      Self::AiEdited => "ai-edited",
    }
  }

  /// Source after the user edits the card's text
  pub fn after_edit(self) -> Self {
    match self {
      Self::Ai | Self::AiEdited => Self::AiEdited,
      Self::Manual => Self::Manual,
    }
  }

  pub fn is_generated(&self) -> bool {
    matches!(self, Self::Ai | Self::AiEdited)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
  pub id: i64,
  pub user_id: String,
  pub front: String,
  pub back: String,
  pub source: FlashcardSource,
  pub source_text_id: Option<i64>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub schedule: CardSchedule,
}

impl Flashcard {
  /// A not-yet-persisted card, due for review immediately.
  pub fn new(
    user_id: &str,
    front: String,
    back: String,
    source: FlashcardSource,
    source_text_id: Option<i64>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: 0,
      user_id: user_id.to_string(),
      front,
      back,
      source,
      source_text_id,
      created_at: now,
      updated_at: now,
      schedule: CardSchedule::new(now),
    }
  }
}

/// Text a batch of AI flashcards was generated from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceText {
  pub id: i64,
  pub user_id: String,
  pub text_content: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
