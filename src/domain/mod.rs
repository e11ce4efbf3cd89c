pub mod card;
pub mod event;
pub mod review;
pub mod schedule;

pub use card::{Flashcard, FlashcardSource, SourceText};
pub use event::{EventLog, EventSeverity, EventType};
pub use review::{Rating, ReviewLog, SessionStats};
pub use schedule::{CardSchedule, CardState, ScheduleError};
