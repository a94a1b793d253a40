// Public API - what other modules can use
pub use handlers::{get_answer_log, get_current_question, get_scoreboard};
pub use models::ProgressionModel;
pub use repository::{AdvanceResult, InMemoryProgressionRepository, ProgressionRepository};
pub use service::{ProgressionService, MAX_ANSWER_LEN};
pub use types::{AnswerLogEntry, AnswerOutcome, ScoreEntry};

// Internal modules
mod handlers;
mod models;
mod repository;
mod service;
mod types;
