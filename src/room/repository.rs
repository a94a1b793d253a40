use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use super::models::{RoomModel, RoomStatus};
use crate::shared::AppError;

/// Result of attempting to join a room
#[derive(Debug, Clone)]
pub enum JoinRoomResult {
    /// Player was added, returns updated room data
    Joined(RoomModel),
    /// Player was already a member (reconnect), room unchanged
    AlreadyMember(RoomModel),
    /// Room is locked and the player is not a member
    MatchAlreadyStarted,
    /// Room does not exist
    RoomNotFound,
}

/// Result of a conditional status update
#[derive(Debug, Clone)]
pub enum StatusTransitionResult {
    /// Status was `from` and is now `to`
    Transitioned(RoomModel),
    /// Status was not `from`; carries the status actually found
    StatusMismatch(RoomStatus),
    RoomNotFound,
}

/// Trait for room repository operations
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError>;
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError>;

    /// All rooms, oldest first
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError>;

    /// Atomically checks membership and lock state and adds the player.
    /// Two simultaneous joins by the same player leave exactly one entry.
    async fn try_join_room(&self, room_id: &str, player_id: &str)
        -> Result<JoinRoomResult, AppError>;

    /// Compare-and-set on the room status
    async fn try_transition_status(
        &self,
        room_id: &str,
        from: RoomStatus,
        to: RoomStatus,
    ) -> Result<StatusTransitionResult, AppError>;

    /// Returns false if the room did not exist
    async fn delete_room(&self, room_id: &str) -> Result<bool, AppError>;
}

/// In-memory implementation of RoomRepository for development and testing
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<String, RoomModel>>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    fn rooms(&self) -> Result<MutexGuard<'_, HashMap<String, RoomModel>>, AppError> {
        self.rooms
            .lock()
            .map_err(|_| AppError::DatabaseError("Room store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, room))]
    async fn create_room(&self, room: &RoomModel) -> Result<(), AppError> {
        debug!(room_id = %room.id, host_id = %room.host_id, "Creating room in memory");

        let mut rooms = self.rooms()?;
        if rooms.contains_key(&room.id) {
            warn!(room_id = %room.id, "Room already exists in memory");
            return Err(AppError::DatabaseError("Room already exists".to_string()));
        }
        rooms.insert(room.id.clone(), room.clone());

        debug!(room_id = %room.id, "Room created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        let rooms = self.rooms()?;
        let room = rooms.get(room_id).cloned();

        match &room {
            Some(r) => debug!(room_id = %room_id, host_id = %r.host_id, "Room found in memory"),
            None => debug!(room_id = %room_id, "Room not found in memory"),
        }

        Ok(room)
    }

    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        let rooms = self.rooms()?;
        let mut room_list: Vec<RoomModel> = rooms.values().cloned().collect();
        room_list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        debug!(count = room_list.len(), "Rooms listed from memory");
        Ok(room_list)
    }

    #[instrument(skip(self))]
    async fn try_join_room(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<JoinRoomResult, AppError> {
        let mut rooms = self.rooms()?;

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                debug!(room_id = %room_id, "Room not found");
                return Ok(JoinRoomResult::RoomNotFound);
            }
        };

        if room.has_member(player_id) {
            debug!(room_id = %room_id, player_id = %player_id, "Player already in room");
            return Ok(JoinRoomResult::AlreadyMember(room.clone()));
        }

        if room.status == RoomStatus::Locked {
            debug!(room_id = %room_id, player_id = %player_id, "Room locked, rejecting join");
            return Ok(JoinRoomResult::MatchAlreadyStarted);
        }

        room.add_member(player_id);
        let updated_room = room.clone();

        info!(
            room_id = %room_id,
            player_id = %player_id,
            new_player_count = updated_room.player_count(),
            "Player joined room successfully (atomic)"
        );

        Ok(JoinRoomResult::Joined(updated_room))
    }

    #[instrument(skip(self))]
    async fn try_transition_status(
        &self,
        room_id: &str,
        from: RoomStatus,
        to: RoomStatus,
    ) -> Result<StatusTransitionResult, AppError> {
        let mut rooms = self.rooms()?;

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => return Ok(StatusTransitionResult::RoomNotFound),
        };

        if room.status != from {
            debug!(
                room_id = %room_id,
                expected = %from,
                actual = %room.status,
                "Room status mismatch"
            );
            return Ok(StatusTransitionResult::StatusMismatch(room.status));
        }

        room.status = from
            .transition(to)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        info!(room_id = %room_id, from = %from, to = %to, "Room status changed");
        Ok(StatusTransitionResult::Transitioned(room.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, room_id: &str) -> Result<bool, AppError> {
        let mut rooms = self.rooms()?;
        let removed = rooms.remove(room_id).is_some();

        if removed {
            info!(room_id = %room_id, "Room deleted from memory");
        } else {
            debug!(room_id = %room_id, "Room already gone");
        }

        Ok(removed)
    }
}
