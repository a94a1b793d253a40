// Public API - what other modules can use
pub use handlers::{get_match_by_room, get_match_review, get_match_summary};
pub use models::{MatchModel, MatchStatus};
pub use repository::{FinishMatchResult, InMemoryMatchRepository, MatchRepository};
pub use service::{MatchService, MAX_QUESTIONS};
pub use types::{EndMatchOutcome, MatchReview, MatchSummary, StartMatchRequest};

// Internal modules
mod handlers;
mod models;
mod repository;
mod service;
mod types;
