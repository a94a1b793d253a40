use serde::{Deserialize, Serialize};

use super::models::{RoomModel, RoomStatus};
use crate::user::PlayerProfile;

/// Request payload for creating a new room. The host comes from the session.
#[derive(Debug, Deserialize)]
pub struct RoomCreateRequest {
    pub name: String,
}

/// Room summary for listings and creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: String,
    pub name: String,
    pub host_id: String,
    pub status: RoomStatus,
    pub player_count: usize,
}

impl From<&RoomModel> for RoomResponse {
    fn from(room: &RoomModel) -> Self {
        Self {
            id: room.id.clone(),
            name: room.name.clone(),
            host_id: room.host_id.clone(),
            status: room.status,
            player_count: room.player_count(),
        }
    }
}

/// Room roster with member profiles in join order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterResponse {
    pub id: String,
    pub name: String,
    pub host_id: String,
    pub status: RoomStatus,
    pub members: Vec<PlayerProfile>,
}

/// Outcome of a successful join
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub room: RoomModel,
    /// True on a rejoin; membership was left unchanged
    pub already_member: bool,
    pub player: PlayerProfile,
}
