use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a room. `Locked` once its match has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Open,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Illegal room transition {from} -> {to}")]
pub struct RoomTransitionError {
    pub from: RoomStatus,
    pub to: RoomStatus,
}

impl RoomStatus {
    /// `Open -> Locked` on match start; `Locked -> Open` only to roll back
    /// a start that failed before the match was announced.
    pub fn transition(self, next: RoomStatus) -> Result<RoomStatus, RoomTransitionError> {
        match (self, next) {
            (RoomStatus::Open, RoomStatus::Locked) | (RoomStatus::Locked, RoomStatus::Open) => {
                Ok(next)
            }
            (from, to) => Err(RoomTransitionError { from, to }),
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Open => write!(f, "OPEN"),
            RoomStatus::Locked => write!(f, "LOCKED"),
        }
    }
}

/// A pre-match lobby
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomModel {
    pub id: String, // Random pet name generated ID
    pub name: String,
    pub host_id: String,
    pub member_ids: Vec<String>, // Join order, host first
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

impl RoomModel {
    /// Creates a new open room with generated ID and the host as sole member
    pub fn new(name: String, host_id: String) -> Self {
        let room_id = petname::Petnames::default().generate_one(2, "-");

        Self {
            id: room_id,
            name,
            member_ids: vec![host_id.clone()],
            host_id,
            status: RoomStatus::Open,
            created_at: Utc::now(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.member_ids.len()
    }

    pub fn has_member(&self, player_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == player_id)
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host_id == player_id
    }

    /// Appends the player unless already present. Returns true if added.
    pub fn add_member(&mut self, player_id: &str) -> bool {
        if self.has_member(player_id) {
            return false;
        }
        self.member_ids.push(player_id.to_string());
        true
    }
}
