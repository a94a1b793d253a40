use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{MatchModel, MatchStatus};
use crate::question::Question;
use crate::settlement::SettlementReport;

/// Host's request to start a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartMatchRequest {
    pub number_of_questions: u32,
    /// A catalog category name, or "Random"
    pub category: String,
    /// "Any", "easy", "medium" or "hard"
    pub difficulty: String,
}

/// The match record without its questions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: String,
    pub room_id: String,
    pub host_id: String,
    pub category: String,
    pub difficulty: String,
    pub requested_questions: u32,
    pub question_count: usize,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<&MatchModel> for MatchSummary {
    fn from(game: &MatchModel) -> Self {
        Self {
            id: game.id.clone(),
            room_id: game.room_id.clone(),
            host_id: game.host_id.clone(),
            category: game.category.clone(),
            difficulty: game.difficulty.clone(),
            requested_questions: game.requested_questions,
            question_count: game.question_count(),
            status: game.status,
            created_at: game.created_at,
            ended_at: game.ended_at,
        }
    }
}

/// Post-game review: the summary plus every question with its answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReview {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct EndMatchOutcome {
    pub match_id: String,
    /// `None` when the match had already been ended
    pub settlement: Option<SettlementReport>,
}
