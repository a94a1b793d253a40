use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::matches::StartMatchRequest;
use crate::room::RoomStatus;
use crate::session::authenticate;
use crate::shared::{AppError, AppState, ConflictKind};
use crate::websockets::channel_subscriber::ChannelKind;
use crate::websockets::messages::{ClientMessage, ServerMessage};

use super::socket::{Connection, MessageHandler};

/// Turns client operations into service calls. Failures are answered with
/// an ERROR message to the sender only.
pub struct WebsocketReceiveHandler {
    state: AppState,
}

impl WebsocketReceiveHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Runs one operation on behalf of the player
    pub async fn dispatch(&self, player_id: &str, message: ClientMessage) -> Result<(), AppError> {
        match message {
            ClientMessage::JoinRoom { room_id } => self.join_room(player_id, &room_id).await,
            ClientMessage::JoinMatch { match_id } => self.join_match(player_id, &match_id).await,
            ClientMessage::StartMatch {
                room_id,
                number_of_questions,
                category,
                difficulty,
            } => {
                let request = StartMatchRequest {
                    number_of_questions,
                    category,
                    difficulty,
                };
                self.start_match(player_id, &room_id, &request).await
            }
            ClientMessage::SubmitAnswer { match_id, answer } => {
                self.submit_answer(player_id, &match_id, &answer).await
            }
            ClientMessage::EndMatch { room_id, match_id } => {
                self.state
                    .match_service
                    .end_match_in_room(&room_id, &match_id, player_id)
                    .await?;
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    async fn join_room(&self, player_id: &str, room_id: &str) -> Result<(), AppError> {
        // Fail before attaching to a channel nobody will ever close
        self.state.room_service.get_room(room_id).await?;

        // Attach first so the joiner sees its own ROOM_JOINED
        let newly_attached = self
            .state
            .channel_subscriber
            .join_room_channel(room_id, player_id)
            .await;

        let outcome = match self.state.room_service.join_room(room_id, player_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                if newly_attached {
                    self.state
                        .channel_subscriber
                        .leave_channel(ChannelKind::Room, room_id, player_id)
                        .await;
                }
                return Err(err);
            }
        };

        // A member rejoining mid-match still needs to find the match
        if outcome.room.status == RoomStatus::Locked {
            match self.state.match_service.get_match_by_room(room_id).await {
                Ok(summary) => {
                    self.send(player_id, &ServerMessage::MatchStarted { match_id: summary.id })
                        .await;
                }
                Err(err) => debug!(%err, "Locked room without a live match"),
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn join_match(&self, player_id: &str, match_id: &str) -> Result<(), AppError> {
        let game = self.state.match_service.get_match(match_id).await?;
        // An ended match has no channel left to follow
        if game.is_over() {
            debug!("Match already over, not attaching");
            return Ok(());
        }

        self.state
            .channel_subscriber
            .join_match_channel(match_id, player_id)
            .await;

        match self
            .state
            .progression_service
            .current_question(match_id, player_id)
            .await
        {
            Ok(question) => {
                self.send(player_id, &ServerMessage::NextQuestion(question))
                    .await;
                Ok(())
            }
            Err(AppError::Forbidden(message)) => {
                self.state
                    .channel_subscriber
                    .leave_channel(ChannelKind::Match, match_id, player_id)
                    .await;
                Err(AppError::Forbidden(message))
            }
            // Finished players stay attached for the results
            Err(err) if err.conflict_kind() == Some(ConflictKind::AlreadyComplete) => {
                debug!(%err, "No current question");
                Ok(())
            }
            // Ended while attaching; drop the channel the attach recreated
            Err(err) if err.conflict_kind() == Some(ConflictKind::MatchOver) => {
                debug!(%err, "Match ended while joining");
                self.state
                    .channel_subscriber
                    .leave_channel(ChannelKind::Match, match_id, player_id)
                    .await;
                self.state.event_bus.close_match_channel(match_id).await;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, request))]
    async fn start_match(
        &self,
        player_id: &str,
        room_id: &str,
        request: &StartMatchRequest,
    ) -> Result<(), AppError> {
        let game = self
            .state
            .match_service
            .start_match(room_id, player_id, request)
            .await?;

        // The host follows the match like everyone else, via MATCH_STARTED
        // and JOIN_MATCH; attaching here only guarantees no result is missed.
        self.state
            .channel_subscriber
            .join_match_channel(&game.id, player_id)
            .await;
        Ok(())
    }

    #[instrument(skip(self, answer))]
    async fn submit_answer(
        &self,
        player_id: &str,
        match_id: &str,
        answer: &str,
    ) -> Result<(), AppError> {
        let outcome = self
            .state
            .progression_service
            .submit_answer(match_id, player_id, answer)
            .await?;

        if let Some(question) = outcome.next_question {
            self.send(player_id, &ServerMessage::NextQuestion(question))
                .await;
        }
        Ok(())
    }

    async fn send(&self, player_id: &str, message: &ServerMessage) {
        match message.to_json() {
            Ok(json) => {
                self.state
                    .connection_manager
                    .send_to_player(player_id, &json)
                    .await
            }
            Err(err) => warn!(player_id = %player_id, %err, "Failed to serialize message"),
        }
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, player_id: &str, message: String) {
        let parsed = match serde_json::from_str::<ClientMessage>(&message) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "Failed to parse WebSocket message");
                self.send(player_id, &ServerMessage::error(format!("Invalid message: {}", e)))
                    .await;
                return;
            }
        };

        let kind = parsed.kind();
        debug!(player_id = %player_id, kind, "Received message");

        if let Err(err) = self.dispatch(player_id, parsed).await {
            warn!(player_id = %player_id, kind, error = %err, "Operation failed");
            self.send(player_id, &ServerMessage::error(err.to_string()))
                .await;
        }
    }
}

/// Authenticates the upgrade via the Sec-WebSocket-Protocol header.
/// GET /ws with the session token as the first offered protocol.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    let token = headers
        .get("sec-websocket-protocol")
        .and_then(|h| h.to_str().ok())
        .and_then(|protocols| protocols.split(',').next())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            warn!("Missing or invalid Sec-WebSocket-Protocol header");
            AppError::Unauthorized("Missing authentication token".to_string())
        })?
        .to_string();

    let claims = authenticate(&app_state, &token).await?;
    let player_id = claims.player_id;

    info!(player_id = %player_id, "WebSocket authentication successful");

    // Browsers drop the connection unless the offered protocol is echoed
    Ok(ws
        .protocols([token])
        .on_upgrade(move |socket| handle_websocket_connection(socket, player_id, app_state)))
}

async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    player_id: String,
    app_state: AppState,
) {
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    let connection_id = app_state
        .connection_manager
        .add_connection(player_id.clone(), outbound_sender)
        .await;

    info!(player_id = %player_id, connection_id, "WebSocket connection established");

    let message_handler = Arc::new(WebsocketReceiveHandler::new(app_state.clone()));
    let connection = Connection::new(
        player_id.clone(),
        connection_id,
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => info!(player_id = %player_id, "WebSocket connection closed cleanly"),
        Err(e) => warn!(player_id = %player_id, error = ?e, "WebSocket connection error"),
    }

    // A newer connection keeps the player's channel memberships
    if app_state
        .connection_manager
        .remove_connection(&player_id, connection_id)
        .await
    {
        app_state.channel_subscriber.leave_all(&player_id).await;
    }
}
