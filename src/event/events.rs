use serde::{Deserialize, Serialize};

use crate::user::PlayerProfile;

/// Membership and lifecycle events, scoped to a room channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomEvent {
    /// A player joined (or rejoined) the room
    PlayerJoined { player: PlayerProfile },
    /// The host started a match; members should attach to its channel
    MatchStarted { match_id: String },
    /// The room was settled and deleted. Always the last event on the channel.
    RoomClosed,
}

/// Question and answer events, scoped to a match channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// A player answered; the submitted text is never included
    QuestionResult { player_id: String, correct: bool },
    /// The host ended the match
    ReturnToLobby,
}
