use serde::{Deserialize, Serialize};

/// Public profile of a player, safe to show to other participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: String,
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

/// A player's profile together with lifetime win/loss aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(flatten)]
    pub profile: PlayerProfile,
    pub win_count: u32,
    pub loss_count: u32,
}

impl PlayerRecord {
    pub fn new(profile: PlayerProfile) -> Self {
        Self {
            profile,
            win_count: 0,
            loss_count: 0,
        }
    }
}
