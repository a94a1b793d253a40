use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::models::{PlayerProfile, PlayerRecord};

/// Player identity collaborator: profiles and lifetime win/loss counters.
///
/// Registration and profile editing belong to the identity service that issues
/// tokens; this directory only mirrors what it needs and owns the aggregates.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Registers the player if unknown, otherwise refreshes display attributes.
    /// Aggregates are never reset.
    async fn ensure_player(&self, profile: PlayerProfile) -> Result<PlayerRecord, DirectoryError>;

    async fn get_player(&self, player_id: &str) -> Option<PlayerRecord>;

    async fn get_profile(&self, player_id: &str) -> Option<PlayerProfile>;

    /// Atomically adds one to the player's win counter, returning the new value
    async fn increment_wins(&self, player_id: &str) -> Result<u32, DirectoryError>;

    /// Atomically adds one to the player's loss counter, returning the new value
    async fn increment_losses(&self, player_id: &str) -> Result<u32, DirectoryError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    #[error("Player {player_id} not found")]
    PlayerNotFound { player_id: String },

    #[error("Invalid player id: {player_id:?}")]
    InvalidPlayerId { player_id: String },
}

/// In-memory implementation of PlayerDirectory
/// Uses RwLock for concurrent access with read optimization
pub struct InMemoryPlayerDirectory {
    players: Arc<RwLock<HashMap<String, PlayerRecord>>>,
}

impl InMemoryPlayerDirectory {
    pub fn new() -> Self {
        Self {
            players: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn increment(
        &self,
        player_id: &str,
        bump: impl FnOnce(&mut PlayerRecord) -> u32 + Send,
    ) -> Result<u32, DirectoryError> {
        let mut players = self.players.write().await;
        match players.get_mut(player_id) {
            Some(record) => Ok(bump(record)),
            None => {
                warn!(player_id = %player_id, "Cannot update aggregates of unknown player");
                Err(DirectoryError::PlayerNotFound {
                    player_id: player_id.to_string(),
                })
            }
        }
    }
}

impl Default for InMemoryPlayerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerDirectory for InMemoryPlayerDirectory {
    async fn ensure_player(&self, profile: PlayerProfile) -> Result<PlayerRecord, DirectoryError> {
        if profile.id.trim().is_empty() {
            return Err(DirectoryError::InvalidPlayerId {
                player_id: profile.id,
            });
        }

        let mut players = self.players.write().await;

        let record = match players.get_mut(&profile.id) {
            Some(existing) => {
                existing.profile = profile;
                existing.clone()
            }
            None => {
                info!(
                    player_id = %profile.id,
                    display_name = %profile.display_name,
                    "Registered new player"
                );
                let record = PlayerRecord::new(profile);
                players.insert(record.profile.id.clone(), record.clone());
                record
            }
        };

        Ok(record)
    }

    async fn get_player(&self, player_id: &str) -> Option<PlayerRecord> {
        let players = self.players.read().await;
        let result = players.get(player_id).cloned();

        debug!(
            player_id = %player_id,
            found = result.is_some(),
            "Player lookup"
        );

        result
    }

    async fn get_profile(&self, player_id: &str) -> Option<PlayerProfile> {
        let players = self.players.read().await;
        players.get(player_id).map(|record| record.profile.clone())
    }

    async fn increment_wins(&self, player_id: &str) -> Result<u32, DirectoryError> {
        self.increment(player_id, |record| {
            record.win_count += 1;
            record.win_count
        })
        .await
    }

    async fn increment_losses(&self, player_id: &str) -> Result<u32, DirectoryError> {
        self.increment(player_id, |record| {
            record.loss_count += 1;
            record.loss_count
        })
        .await
    }
}
