use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

/// Outbound delivery to connected players, one live connection per player
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    /// Registers the sender as the player's connection, replacing any older
    /// one. Returns an id for [`remove_connection`](Self::remove_connection).
    async fn add_connection(&self, player_id: String, sender: mpsc::UnboundedSender<String>) -> u64;

    /// Removes the connection if it is still the player's current one.
    /// Returns false if a newer connection has taken over.
    async fn remove_connection(&self, player_id: &str, connection_id: u64) -> bool;

    /// Best effort: a player without a connection is skipped
    async fn send_to_player(&self, player_id: &str, message: &str);

    async fn send_to_players(&self, player_ids: &[String], message: &str);
}

struct Registered {
    connection_id: u64,
    sender: mpsc::UnboundedSender<String>,
}

pub struct InMemoryConnectionManager {
    // player_id -> sender
    connections: Arc<RwLock<HashMap<String, Registered>>>,
    next_id: AtomicU64,
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, player_id: String, sender: mpsc::UnboundedSender<String>) -> u64 {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut connections = self.connections.write().await;
        let replaced = connections
            .insert(
                player_id.clone(),
                Registered {
                    connection_id,
                    sender,
                },
            )
            .is_some();

        info!(player_id = %player_id, connection_id, replaced, "Connection registered");
        connection_id
    }

    async fn remove_connection(&self, player_id: &str, connection_id: u64) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(player_id) {
            Some(current) if current.connection_id == connection_id => {
                connections.remove(player_id);
                info!(player_id = %player_id, connection_id, "Connection removed");
                true
            }
            _ => {
                debug!(player_id = %player_id, connection_id, "Stale connection, nothing removed");
                false
            }
        }
    }

    async fn send_to_player(&self, player_id: &str, message: &str) {
        let connections = self.connections.read().await;
        if let Some(registered) = connections.get(player_id) {
            let _ = registered.sender.send(message.to_string());
        }
    }

    async fn send_to_players(&self, player_ids: &[String], message: &str) {
        let connections = self.connections.read().await;
        for player_id in player_ids {
            if let Some(registered) = connections.get(player_id) {
                let _ = registered.sender.send(message.to_string());
            }
        }
    }
}
