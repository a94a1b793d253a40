use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::RoomModel,
    repository::{JoinRoomResult, RoomRepository},
    types::{JoinOutcome, RoomResponse, RosterResponse},
};
use crate::event::{EventBus, RoomEvent};
use crate::shared::{AppError, ConflictKind};
use crate::user::{PlayerDirectory, PlayerProfile};

const MAX_ROOM_NAME_LEN: usize = 64;

/// Service for handling room membership
pub struct RoomService {
    repository: Arc<dyn RoomRepository>,
    directory: Arc<dyn PlayerDirectory>,
    event_bus: EventBus,
}

impl RoomService {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        directory: Arc<dyn PlayerDirectory>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            repository,
            directory,
            event_bus,
        }
    }

    /// Creates a new open room with the host as its only member
    #[instrument(skip(self))]
    pub async fn create_room(&self, name: &str, host_id: &str) -> Result<RoomResponse, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Room name must not be empty".to_string()));
        }
        if name.chars().count() > MAX_ROOM_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Room name must be at most {} characters",
                MAX_ROOM_NAME_LEN
            )));
        }

        let room_model = RoomModel::new(name.to_string(), host_id.to_string());
        debug!(room_id = %room_model.id, "Generated room ID");

        self.repository.create_room(&room_model).await?;

        info!(
            room_id = %room_model.id,
            host_id = %host_id,
            "Room created successfully"
        );

        Ok(RoomResponse::from(&room_model))
    }

    /// Gets the full room model, failing with NotFound
    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: &str) -> Result<RoomModel, AppError> {
        self.repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))
    }

    /// Lists all rooms, oldest first
    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<RoomResponse>, AppError> {
        let rooms = self.repository.list_rooms().await?;
        debug!(room_count = rooms.len(), "Rooms retrieved successfully");
        Ok(rooms.iter().map(RoomResponse::from).collect())
    }

    /// Name, host and member profiles in join order
    #[instrument(skip(self))]
    pub async fn get_roster(&self, room_id: &str) -> Result<RosterResponse, AppError> {
        let room = self.get_room(room_id).await?;

        let mut members = Vec::with_capacity(room.member_ids.len());
        for member_id in &room.member_ids {
            members.push(self.profile_or_placeholder(member_id).await);
        }

        Ok(RosterResponse {
            id: room.id,
            name: room.name,
            host_id: room.host_id,
            status: room.status,
            members,
        })
    }

    /// Adds the player to the room, or treats the call as a rejoin if they
    /// are already a member. Locked rooms only admit existing members.
    /// Either way the room channel is told who joined.
    #[instrument(skip(self))]
    pub async fn join_room(&self, room_id: &str, player_id: &str) -> Result<JoinOutcome, AppError> {
        let player = self
            .directory
            .get_profile(player_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Player {} not found", player_id)))?;

        let (room, already_member) = match self.repository.try_join_room(room_id, player_id).await? {
            JoinRoomResult::Joined(room) => (room, false),
            JoinRoomResult::AlreadyMember(room) => (room, true),
            JoinRoomResult::MatchAlreadyStarted => {
                warn!(room_id = %room_id, player_id = %player_id, "Join rejected, room locked");
                return Err(AppError::conflict(
                    ConflictKind::MatchAlreadyStarted,
                    "Match already started",
                ));
            }
            JoinRoomResult::RoomNotFound => {
                return Err(AppError::NotFound(format!("Room {} not found", room_id)));
            }
        };

        info!(
            room_id = %room_id,
            player_id = %player_id,
            already_member,
            player_count = room.player_count(),
            "Player joined room"
        );

        self.event_bus
            .emit_to_room(
                room_id,
                RoomEvent::PlayerJoined {
                    player: player.clone(),
                },
            )
            .await;

        Ok(JoinOutcome {
            room,
            already_member,
            player,
        })
    }

    async fn profile_or_placeholder(&self, player_id: &str) -> PlayerProfile {
        match self.directory.get_profile(player_id).await {
            Some(profile) => profile,
            None => {
                warn!(player_id = %player_id, "Member has no profile");
                PlayerProfile {
                    id: player_id.to_string(),
                    display_name: player_id.to_string(),
                    avatar_ref: None,
                }
            }
        }
    }
}
