use serde::{Deserialize, Serialize};

use crate::question::QuestionView;
use crate::user::PlayerProfile;

/// Result of one answer submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// `None` once the player has answered the last question
    pub next_question: Option<QuestionView>,
    pub cursor: usize,
    pub question_count: usize,
}

/// Live scoreboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub player: PlayerProfile,
    pub correct_answers: u32,
    pub cursor: usize,
}

/// Post-game row including what the player submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerLogEntry {
    pub player: PlayerProfile,
    pub correct_answers: u32,
    pub cursor: usize,
    pub answers: Vec<String>,
}
