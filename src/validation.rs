//! Request input validation.
//!
//! Lengths are counted in characters, not bytes. Text that is empty after
//! trimming is rejected, but accepted text is stored as given.

use crate::config::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_BACK_CHARS, MAX_FRONT_CHARS, MAX_PER_PAGE, MAX_SOURCE_TEXT_CHARS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
  pub field: &'static str,
  pub message: String,
}

impl ValidationError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self {
      field,
      message: message.into(),
    }
  }
}

fn bounded_text(field: &'static str, label: &str, value: &str, max: usize) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    return Err(ValidationError::new(field, format!("{} is required", label)));
  }
  if value.chars().count() > max {
    return Err(ValidationError::new(
      field,
      format!("{} must be at most {} characters", label, max),
    ));
  }
  Ok(())
}

pub fn validate_front(front: &str) -> Result<(), ValidationError> {
  bounded_text("front", "Front", front, MAX_FRONT_CHARS)
}

pub fn validate_back(back: &str) -> Result<(), ValidationError> {
  bounded_text("back", "Back", back, MAX_BACK_CHARS)
}

pub fn validate_text_content(text: &str) -> Result<(), ValidationError> {
  bounded_text("textContent", "Text content", text, MAX_SOURCE_TEXT_CHARS)
}

/// Checked page and page size from raw query values
pub fn parse_pagination(page: Option<&str>, per_page: Option<&str>) -> Result<(u32, u32), ValidationError> {
  let page = match page {
    None => DEFAULT_PAGE,
    Some(raw) => raw
      .trim()
      .parse::<u32>()
      .ok()
      .filter(|p| *p >= 1)
      .ok_or_else(|| ValidationError::new("page", "Page must be a positive integer"))?,
  };

  let per_page = match per_page {
    None => DEFAULT_PER_PAGE,
    Some(raw) => raw
      .trim()
      .parse::<u32>()
      .ok()
      .filter(|n| (1..=MAX_PER_PAGE).contains(n))
      .ok_or_else(|| {
        ValidationError::new("perPage", format!("Per page must be between 1 and {}", MAX_PER_PAGE))
      })?,
  };

  Ok((page, per_page))
}

/// Parse an optional enum-valued query parameter
pub fn parse_choice<T>(field: &'static str, raw: Option<&str>, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>, ValidationError> {
  match raw {
    None => Ok(None),
    Some(value) => parse(value)
      .map(Some)
      .ok_or_else(|| ValidationError::new(field, format!("Invalid {}: {}", field, value))),
  }
}
