use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
  AiCardCreated,
  AiEditedCardCreated,
  ManualCardCreated,
  AiCardReviewed,
  CardEdited,
  CardDeleted,
}

impl EventType {
  pub const ALL: [EventType; 6] = [
    EventType::AiCardCreated,
    EventType::AiEditedCardCreated,
    EventType::ManualCardCreated,
    EventType::AiCardReviewed,
    EventType::CardEdited,
    EventType::CardDeleted,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::AiCardCreated => "aiCardCreated",
      Self::AiEditedCardCreated => "aiEditedCardCreated",
      Self::ManualCardCreated => "manualCardCreated",
      Self::AiCardReviewed => "aiCardReviewed",
      Self::CardEdited => "cardEdited",
      Self::CardDeleted => "cardDeleted",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|t| t.as_str() == s)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
  Info,
  Warning,
  Error,
  Critical,
}

impl EventSeverity {
  pub const ALL: [EventSeverity; 4] = [
    EventSeverity::Info,
    EventSeverity::Warning,
    EventSeverity::Error,
    EventSeverity::Critical,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Info => "info",
      Self::Warning => "warning",
      Self::Error => "error",
      Self::Critical => "critical",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|t| t.as_str() == s)
  }
}

/// Audit record of a user action on flashcards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
  pub id: i64,
  pub user_id: String,
  pub event_type: EventType,
  pub timestamp: DateTime<Utc>,
  pub severity: EventSeverity,
  pub payload: serde_json::Value,
}

impl EventLog {
  pub fn info(user_id: &str, event_type: EventType, payload: serde_json::Value) -> Self {
    Self {
      id: 0,
      user_id: user_id.to_string(),
      event_type,
      timestamp: Utc::now(),
      severity: EventSeverity::Info,
      payload,
    }
  }
}
