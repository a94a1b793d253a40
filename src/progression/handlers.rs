use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::instrument;

use super::types::{AnswerLogEntry, ScoreEntry};
use crate::question::QuestionView;
use crate::session::SessionClaims;
use crate::shared::{AppError, AppState};

/// GET /matches/:match_id/question
///
/// The caller's current question. Lets a reconnecting client resume.
#[instrument(name = "get_current_question", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn get_current_question(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(match_id): Path<String>,
) -> Result<Json<QuestionView>, AppError> {
    let question = state
        .progression_service
        .current_question(&match_id, &claims.player_id)
        .await?;
    Ok(Json(question))
}

/// GET /matches/:match_id/scores
#[instrument(name = "get_scoreboard", skip(state))]
pub async fn get_scoreboard(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<Vec<ScoreEntry>>, AppError> {
    Ok(Json(state.progression_service.scoreboard(&match_id).await?))
}

/// GET /matches/:match_id/answers
#[instrument(name = "get_answer_log", skip(state))]
pub async fn get_answer_log(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<Vec<AnswerLogEntry>>, AppError> {
    Ok(Json(state.progression_service.answer_log(&match_id).await?))
}
