use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use super::types::{MatchReview, MatchSummary};
use crate::shared::{AppError, AppState};

/// GET /matches/:match_id
#[instrument(name = "get_match_summary", skip(state))]
pub async fn get_match_summary(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(state.match_service.get_match_summary(&match_id).await?))
}

/// GET /rooms/:room_id/match
#[instrument(name = "get_match_by_room", skip(state))]
pub async fn get_match_by_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(state.match_service.get_match_by_room(&room_id).await?))
}

/// GET /matches/:match_id/review
///
/// Full question set with answers, once the match is over.
#[instrument(name = "get_match_review", skip(state))]
pub async fn get_match_review(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<MatchReview>, AppError> {
    Ok(Json(state.match_service.get_match_review(&match_id).await?))
}
