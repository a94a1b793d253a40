//! Connection manager that records outbound messages instead of sending them
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{sleep, Duration, Instant};

use trivia_server::websockets::ConnectionManager;

// ============================================================================
// Mock Infrastructure
// ============================================================================

const WAIT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<String, VecDeque<String>>>>,
    // player_id -> current connection id
    connections: Arc<RwLock<HashMap<String, u64>>>,
    next_id: Arc<AtomicU64>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(RwLock::new(HashMap::new())),
            connections: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn add_connected_player(&self, player_id: &str) -> u64 {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections
            .write()
            .await
            .insert(player_id.to_string(), connection_id);
        connection_id
    }

    pub async fn is_connected(&self, player_id: &str) -> bool {
        self.connections.read().await.contains_key(player_id)
    }

    /// Everything currently queued for the player, without consuming it
    pub async fn get_messages_for(&self, player_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(player_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes and returns the first queued message whose "type" matches,
    /// waiting briefly for asynchronous channel delivery.
    pub async fn consume_message_of_type(&self, player_id: &str, message_type: &str) -> Option<String> {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            {
                let mut sent = self.sent_messages.write().await;
                if let Some(queue) = sent.get_mut(player_id) {
                    let found = queue.iter().position(|raw| type_of(raw).as_deref() == Some(message_type));
                    if let Some(index) = found {
                        return queue.remove(index);
                    }
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(Duration::from_millis(5)).await;
        }
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }

    async fn record(&self, player_id: &str, message: &str) {
        self.sent_messages
            .write()
            .await
            .entry(player_id.to_string())
            .or_default()
            .push_back(message.to_string());
    }
}

pub fn type_of(raw: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| value["type"].as_str().map(str::to_string))
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(&self, player_id: String, _sender: mpsc::UnboundedSender<String>) -> u64 {
        self.add_connected_player(&player_id).await
    }

    async fn remove_connection(&self, player_id: &str, connection_id: u64) -> bool {
        let mut connections = self.connections.write().await;
        if connections.get(player_id) == Some(&connection_id) {
            connections.remove(player_id);
            true
        } else {
            false
        }
    }

    async fn send_to_player(&self, player_id: &str, message: &str) {
        if self.is_connected(player_id).await {
            self.record(player_id, message).await;
        }
    }

    async fn send_to_players(&self, player_ids: &[String], message: &str) {
        for player_id in player_ids {
            self.send_to_player(player_id, message).await;
        }
    }
}
