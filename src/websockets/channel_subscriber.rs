use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::event::{
    ChannelEventError, ChannelEventHandler, ChannelSubscription, EventBus, MatchEvent, RoomEvent,
};
use crate::websockets::connection_manager::ConnectionManager;
use crate::websockets::messages::ServerMessage;

/// Players attached to the channels of one family, and the task forwarding
/// each channel's events.
struct ChannelGroup {
    members: HashMap<String, HashSet<String>>,
    tasks: HashMap<String, JoinHandle<()>>,
}

impl ChannelGroup {
    fn new() -> Self {
        Self {
            members: HashMap::new(),
            tasks: HashMap::new(),
        }
    }

    fn needs_task(&self, channel_id: &str) -> bool {
        self.tasks
            .get(channel_id)
            .map_or(true, |task| task.is_finished())
    }

    /// Returns true if the player was attached
    fn remove_member(&mut self, channel_id: &str, player_id: &str) -> bool {
        let Some(members) = self.members.get_mut(channel_id) else {
            return false;
        };
        let removed = members.remove(player_id);
        if members.is_empty() {
            self.members.remove(channel_id);
            if let Some(task) = self.tasks.remove(channel_id) {
                task.abort();
            }
        }
        removed
    }

    fn sorted_members(&self, channel_id: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .members
            .get(channel_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }
}

/// Which channel family a membership refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Room,
    Match,
}

/// Fans room and match events out to the WebSocket connections that joined
/// those channels.
///
/// A connection only receives events for channels it joined explicitly. One
/// forwarding task runs per channel while it has at least one member.
pub struct WebSocketChannelSubscriber {
    connection_manager: Arc<dyn ConnectionManager>,
    event_bus: EventBus,
    rooms: Mutex<ChannelGroup>,
    matches: Mutex<ChannelGroup>,
}

impl WebSocketChannelSubscriber {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>, event_bus: EventBus) -> Self {
        Self {
            connection_manager,
            event_bus,
            rooms: Mutex::new(ChannelGroup::new()),
            matches: Mutex::new(ChannelGroup::new()),
        }
    }

    /// Attaches the player to the room channel. The channel is subscribed
    /// before this returns, so events emitted afterwards are delivered.
    /// Returns true if the player was not attached yet.
    pub async fn join_room_channel(self: &Arc<Self>, room_id: &str, player_id: &str) -> bool {
        let handler: Arc<dyn ChannelEventHandler<RoomEvent>> = self.clone();
        let mut group = self.rooms.lock().await;
        let receiver = if group.needs_task(room_id) {
            Some(self.event_bus.subscribe_to_room(room_id).await)
        } else {
            None
        };
        attach(&mut group, room_id, player_id, handler, receiver)
    }

    pub async fn join_match_channel(self: &Arc<Self>, match_id: &str, player_id: &str) -> bool {
        let handler: Arc<dyn ChannelEventHandler<MatchEvent>> = self.clone();
        let mut group = self.matches.lock().await;
        let receiver = if group.needs_task(match_id) {
            Some(self.event_bus.subscribe_to_match(match_id).await)
        } else {
            None
        };
        attach(&mut group, match_id, player_id, handler, receiver)
    }

    pub async fn leave_channel(&self, kind: ChannelKind, channel_id: &str, player_id: &str) -> bool {
        let removed = self.group(kind).lock().await.remove_member(channel_id, player_id);
        if removed {
            debug!(?kind, channel_id = %channel_id, player_id = %player_id, "Left channel");
        }
        removed
    }

    /// Detaches the player from every channel, used on disconnect
    pub async fn leave_all(&self, player_id: &str) {
        for kind in [ChannelKind::Room, ChannelKind::Match] {
            let mut group = self.group(kind).lock().await;
            let channels: Vec<String> = group
                .members
                .iter()
                .filter(|(_, members)| members.contains(player_id))
                .map(|(channel_id, _)| channel_id.clone())
                .collect();
            for channel_id in channels {
                group.remove_member(&channel_id, player_id);
            }
        }
        info!(player_id = %player_id, "Player detached from all channels");
    }

    /// Attached players, sorted
    pub async fn members(&self, kind: ChannelKind, channel_id: &str) -> Vec<String> {
        self.group(kind).lock().await.sorted_members(channel_id)
    }

    pub async fn has_forwarding_task(&self, kind: ChannelKind, channel_id: &str) -> bool {
        !self.group(kind).lock().await.needs_task(channel_id)
    }

    fn group(&self, kind: ChannelKind) -> &Mutex<ChannelGroup> {
        match kind {
            ChannelKind::Room => &self.rooms,
            ChannelKind::Match => &self.matches,
        }
    }

    async fn broadcast(
        &self,
        kind: ChannelKind,
        channel_id: &str,
        message: &ServerMessage,
    ) -> Result<(), ChannelEventError> {
        let members = self.members(kind, channel_id).await;
        if members.is_empty() {
            return Err(ChannelEventError::ChannelNotFound(channel_id.to_string()));
        }

        let json = message
            .to_json()
            .map_err(|e| ChannelEventError::HandlerError(e.to_string()))?;
        self.connection_manager.send_to_players(&members, &json).await;

        debug!(
            ?kind,
            channel_id = %channel_id,
            recipients = members.len(),
            "Broadcast to channel"
        );
        Ok(())
    }
}

fn attach<E>(
    group: &mut ChannelGroup,
    channel_id: &str,
    player_id: &str,
    handler: Arc<dyn ChannelEventHandler<E>>,
    receiver: Option<broadcast::Receiver<E>>,
) -> bool
where
    E: Clone + Debug + Send + 'static,
{
    if let Some(receiver) = receiver {
        let task = ChannelSubscription::new(channel_id.to_string(), handler, receiver).start();
        group.tasks.insert(channel_id.to_string(), task);
    }

    let added = group
        .members
        .entry(channel_id.to_string())
        .or_default()
        .insert(player_id.to_string());

    debug!(channel_id = %channel_id, player_id = %player_id, added, "Joined channel");
    added
}

#[async_trait]
impl ChannelEventHandler<RoomEvent> for WebSocketChannelSubscriber {
    async fn handle_event(&self, room_id: &str, event: RoomEvent) -> Result<(), ChannelEventError> {
        match event {
            RoomEvent::PlayerJoined { player } => {
                let message = ServerMessage::RoomJoined {
                    player_id: player.id,
                    display_name: player.display_name,
                    avatar_ref: player.avatar_ref,
                };
                self.broadcast(ChannelKind::Room, room_id, &message).await
            }
            RoomEvent::MatchStarted { match_id } => {
                let message = ServerMessage::MatchStarted { match_id };
                self.broadcast(ChannelKind::Room, room_id, &message).await
            }
            RoomEvent::RoomClosed => {
                let mut group = self.rooms.lock().await;
                let detached = group.members.remove(room_id).map_or(0, |m| m.len());
                // The task is the caller; it ends once the channel closes
                group.tasks.remove(room_id);
                info!(room_id = %room_id, detached, "Room closed, members detached");
                Ok(())
            }
        }
    }

    fn handler_name(&self) -> &'static str {
        "WebSocketChannelSubscriber(room)"
    }
}

#[async_trait]
impl ChannelEventHandler<MatchEvent> for WebSocketChannelSubscriber {
    async fn handle_event(&self, match_id: &str, event: MatchEvent) -> Result<(), ChannelEventError> {
        let (message, last) = match event {
            MatchEvent::QuestionResult { player_id, correct } => {
                (ServerMessage::QuestionResult { player_id, correct }, false)
            }
            MatchEvent::ReturnToLobby => (ServerMessage::ReturnToLobby, true),
        };

        if let Err(err) = self.broadcast(ChannelKind::Match, match_id, &message).await {
            // Everyone may have disconnected already
            warn!(match_id = %match_id, %err, "Match event had no recipients");
        }

        if last {
            let mut group = self.matches.lock().await;
            let detached = group.members.remove(match_id).map_or(0, |m| m.len());
            // The task is the caller; it ends once the channel closes
            group.tasks.remove(match_id);
            info!(match_id = %match_id, detached, "Match ended, members detached");
        }
        Ok(())
    }

    fn handler_name(&self) -> &'static str {
        "WebSocketChannelSubscriber(match)"
    }
}
