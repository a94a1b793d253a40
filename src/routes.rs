use axum::{middleware, routing::get, routing::post, Router};

use crate::matches::{get_match_by_room, get_match_review, get_match_summary};
use crate::progression::{get_answer_log, get_current_question, get_scoreboard};
use crate::room::{create_room, get_roster, list_rooms};
use crate::session::jwt_auth;
use crate::shared::AppState;
use crate::websockets::websocket_handler;

/// HTTP routes require a Bearer token. The websocket route authenticates
/// during the handshake instead, since browsers cannot set headers there.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/rooms", post(create_room).get(list_rooms))
        .route("/rooms/:room_id/players", get(get_roster))
        .route("/rooms/:room_id/match", get(get_match_by_room))
        .route("/matches/:match_id", get(get_match_summary))
        .route("/matches/:match_id/question", get(get_current_question))
        .route("/matches/:match_id/review", get(get_match_review))
        .route("/matches/:match_id/scores", get(get_scoreboard))
        .route("/matches/:match_id/answers", get(get_answer_log))
        .layer(middleware::from_fn_with_state(state.clone(), jwt_auth));

    Router::new()
        .route("/", get(|| async { "Trivia server" }))
        .route("/ws", get(websocket_handler))
        .merge(api)
        .with_state(state)
}
