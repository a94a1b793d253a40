use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::events::{MatchEvent, RoomEvent};

/// Keyed family of broadcast channels, created lazily on first subscribe
#[derive(Debug)]
struct ChannelMap<E> {
    kind: &'static str,
    capacity: usize,
    senders: RwLock<HashMap<String, broadcast::Sender<E>>>,
}

impl<E: Clone> ChannelMap<E> {
    fn new(kind: &'static str, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            senders: RwLock::new(HashMap::new()),
        }
    }

    async fn emit(&self, channel_id: &str, event: E) -> usize {
        let senders = self.senders.read().await;

        match senders.get(channel_id) {
            Some(sender) => match sender.send(event) {
                Ok(receiver_count) => {
                    debug!(
                        kind = self.kind,
                        channel_id = %channel_id,
                        receivers = receiver_count,
                        "Event emitted"
                    );
                    receiver_count
                }
                Err(_) => {
                    debug!(kind = self.kind, channel_id = %channel_id, "Event emitted with no receivers");
                    0
                }
            },
            None => {
                // Nobody has subscribed yet, so nobody can miss it
                debug!(kind = self.kind, channel_id = %channel_id, "No channel found - event dropped");
                0
            }
        }
    }

    async fn subscribe(&self, channel_id: &str) -> broadcast::Receiver<E> {
        {
            let senders = self.senders.read().await;
            if let Some(sender) = senders.get(channel_id) {
                return sender.subscribe();
            }
        }

        let mut senders = self.senders.write().await;
        // Another subscriber may have created it between the two locks
        let sender = senders.entry(channel_id.to_string()).or_insert_with(|| {
            debug!(kind = self.kind, channel_id = %channel_id, "Creating new channel for subscription");
            broadcast::channel(self.capacity).0
        });
        sender.subscribe()
    }

    /// Drops the sender; receivers drain what is buffered, then see `Closed`
    async fn close(&self, channel_id: &str) -> bool {
        let mut senders = self.senders.write().await;
        let closed = senders.remove(channel_id).is_some();
        debug!(kind = self.kind, channel_id = %channel_id, closed, "Channel closed");
        closed
    }

    async fn has_channel(&self, channel_id: &str) -> bool {
        self.senders.read().await.contains_key(channel_id)
    }
}

/// Event bus for distributing room and match events to subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Room-specific event channels: room_id -> sender
    rooms: Arc<ChannelMap<RoomEvent>>,
    /// Match-specific event channels: match_id -> sender
    matches: Arc<ChannelMap<MatchEvent>>,
}

impl EventBus {
    /// Creates a new event bus; `capacity` is the buffer of each channel
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(ChannelMap::new("room", capacity)),
            matches: Arc::new(ChannelMap::new("match", capacity)),
        }
    }

    /// Emits an event to all subscribers of a specific room.
    /// Returns the number of receivers reached.
    pub async fn emit_to_room(&self, room_id: &str, event: RoomEvent) -> usize {
        self.rooms.emit(room_id, event).await
    }

    pub async fn subscribe_to_room(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        self.rooms.subscribe(room_id).await
    }

    pub async fn close_room_channel(&self, room_id: &str) -> bool {
        self.rooms.close(room_id).await
    }

    pub async fn has_room_channel(&self, room_id: &str) -> bool {
        self.rooms.has_channel(room_id).await
    }

    /// Emits an event to all subscribers of a specific match
    pub async fn emit_to_match(&self, match_id: &str, event: MatchEvent) -> usize {
        self.matches.emit(match_id, event).await
    }

    pub async fn subscribe_to_match(&self, match_id: &str) -> broadcast::Receiver<MatchEvent> {
        self.matches.subscribe(match_id).await
    }

    pub async fn close_match_channel(&self, match_id: &str) -> bool {
        self.matches.close(match_id).await
    }

    pub async fn has_match_channel(&self, match_id: &str) -> bool {
        self.matches.has_channel(match_id).await
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
