//! Application services.
//!
//! Logic shared by handlers that goes beyond a single table.

pub mod generation;
pub mod review;

pub use generation::{CandidateCard, FlashcardGenerator, GenerationError, PlaceholderGenerator};
pub use review::{apply_review, ReviewError, ReviewOutcome};
