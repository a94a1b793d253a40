use serde::{Deserialize, Serialize};

use crate::question::QuestionView;

fn default_category() -> String {
    crate::question::Category::WILDCARD.to_string()
}

fn default_difficulty() -> String {
    "Any".to_string()
}

/// Client -> Server operations.
///
/// Wire format: `{"type": "SUBMIT_ANSWER", "payload": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    JoinRoom {
        room_id: String,
    },
    JoinMatch {
        match_id: String,
    },
    StartMatch {
        room_id: String,
        number_of_questions: u32,
        #[serde(default = "default_category")]
        category: String,
        #[serde(default = "default_difficulty")]
        difficulty: String,
    },
    SubmitAnswer {
        match_id: String,
        answer: String,
    },
    EndMatch {
        room_id: String,
        match_id: String,
    },
}

impl ClientMessage {
    /// Short name for logging, never includes answer text
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::JoinRoom { .. } => "JOIN_ROOM",
            ClientMessage::JoinMatch { .. } => "JOIN_MATCH",
            ClientMessage::StartMatch { .. } => "START_MATCH",
            ClientMessage::SubmitAnswer { .. } => "SUBMIT_ANSWER",
            ClientMessage::EndMatch { .. } => "END_MATCH",
        }
    }
}

/// Server -> Client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Room channel: someone joined or rejoined
    RoomJoined {
        player_id: String,
        display_name: String,
        avatar_ref: Option<String>,
    },
    /// Room channel: attach to this match next
    MatchStarted { match_id: String },
    /// Match channel: a participant answered
    QuestionResult { player_id: String, correct: bool },
    /// Unicast to the answering player
    NextQuestion(QuestionView),
    /// Match channel: the host ended the match
    ReturnToLobby,
    /// Unicast: an operation failed
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
