pub mod card_selector;
pub mod fsrs_scheduler;
pub mod progress;

pub use card_selector::{due_set, due_set_by, next_due_at};
pub use fsrs_scheduler::{schedule_next_review, Scheduler, GRADUATING_REPETITIONS};
pub use progress::{is_due, knowledge_level, progress_percent, time_until_due, DueIn, KnowledgeLevel};
