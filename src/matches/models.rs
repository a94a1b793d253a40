use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::question::Question;

/// Match lifecycle. Linear: no skipping, no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Created,
    InProgress,
    Over,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Illegal match transition {from} -> {to}")]
pub struct MatchTransitionError {
    pub from: MatchStatus,
    pub to: MatchStatus,
}

impl MatchStatus {
    pub fn transition(self, next: MatchStatus) -> Result<MatchStatus, MatchTransitionError> {
        match (self, next) {
            (MatchStatus::Created, MatchStatus::InProgress)
            | (MatchStatus::InProgress, MatchStatus::Over) => Ok(next),
            (from, to) => Err(MatchTransitionError { from, to }),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Created => write!(f, "CREATED"),
            MatchStatus::InProgress => write!(f, "IN_PROGRESS"),
            MatchStatus::Over => write!(f, "OVER"),
        }
    }
}

/// One play-through of a fixed question sequence for a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchModel {
    pub id: String,
    pub room_id: String,
    /// Captured at start; the room is gone by the time the match ends
    pub host_id: String,
    pub questions: Vec<Question>,
    pub category: String,
    pub difficulty: String,
    pub requested_questions: u32,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl MatchModel {
    pub fn new(
        room_id: String,
        host_id: String,
        questions: Vec<Question>,
        category: String,
        difficulty: String,
        requested_questions: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_id,
            host_id,
            questions,
            category,
            difficulty,
            requested_questions,
            status: MatchStatus::Created,
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question_at(&self, cursor: usize) -> Option<&Question> {
        self.questions.get(cursor)
    }

    pub fn is_over(&self) -> bool {
        self.status == MatchStatus::Over
    }

    pub fn start(&mut self) -> Result<(), MatchTransitionError> {
        self.status = self.status.transition(MatchStatus::InProgress)?;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), MatchTransitionError> {
        self.status = self.status.transition(MatchStatus::Over)?;
        self.ended_at = Some(Utc::now());
        Ok(())
    }
}
