use serde::{Deserialize, Serialize};

use crate::user::PlayerProfile;

/// JWT claims issued by the identity service.
/// Carries the player's public profile so the server can register the player
/// on first contact without a separate lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub player_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

impl SessionClaims {
    pub fn profile(&self) -> PlayerProfile {
        PlayerProfile {
            id: self.player_id.clone(),
            display_name: self.display_name.clone(),
            avatar_ref: self.avatar_ref.clone(),
        }
    }
}
