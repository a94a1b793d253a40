use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::{info, instrument};

use super::types::{RoomCreateRequest, RoomResponse, RosterResponse};
use crate::session::SessionClaims;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new room hosted by the caller
///
/// POST /rooms
#[instrument(name = "create_room", skip(state, claims))]
pub async fn create_room(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(request): Json<RoomCreateRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = state
        .room_service
        .create_room(&request.name, &claims.player_id)
        .await?;

    info!(room_id = %room.id, host_id = %room.host_id, "Room created via HTTP");

    Ok(Json(room))
}

/// HTTP handler for listing all rooms
///
/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let rooms = state.room_service.list_rooms().await?;
    Ok(Json(rooms))
}

/// GET /rooms/:room_id/players
#[instrument(name = "get_roster", skip(state))]
pub async fn get_roster(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RosterResponse>, AppError> {
    let roster = state.room_service.get_roster(&room_id).await?;
    Ok(Json(roster))
}
