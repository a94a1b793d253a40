use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One player's state within a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionModel {
    pub player_id: String,
    pub match_id: String,
    /// Index of the next unanswered question, `0..=N`
    pub cursor: usize,
    pub correct_answers: u32,
    /// Submitted texts, one per answered question
    pub answers: Vec<String>,
    /// Room join order at match start; settlement tie-breaker
    pub position: usize,
    pub created_at: DateTime<Utc>,
}

impl ProgressionModel {
    pub fn new(player_id: String, match_id: String, position: usize) -> Self {
        Self {
            player_id,
            match_id,
            cursor: 0,
            correct_answers: 0,
            answers: Vec::new(),
            position,
            created_at: Utc::now(),
        }
    }

    /// True once every one of `question_count` questions has been answered
    pub fn is_complete(&self, question_count: usize) -> bool {
        self.cursor >= question_count
    }

    /// Appends the answer and moves the cursor by one
    pub fn record_answer(&mut self, answer: String, correct: bool) {
        self.answers.push(answer);
        self.cursor += 1;
        if correct {
            self.correct_answers += 1;
        }
    }
}
