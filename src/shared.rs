use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::event::EventBus;
use crate::matches::{InMemoryMatchRepository, MatchService};
use crate::progression::{InMemoryProgressionRepository, ProgressionService};
use crate::question::QuestionProvider;
use crate::room::{repository::InMemoryRoomRepository, RoomService};
use crate::session::TokenConfig;
use crate::settlement::SettlementService;
use crate::user::{InMemoryPlayerDirectory, PlayerDirectory};
use crate::websockets::{ConnectionManager, WebSocketChannelSubscriber};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub match_service: Arc<MatchService>,
    pub progression_service: Arc<ProgressionService>,
    pub player_directory: Arc<dyn PlayerDirectory>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub channel_subscriber: Arc<WebSocketChannelSubscriber>,
    pub token_config: TokenConfig,
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires every service against the in-memory stores.
    pub fn in_memory(
        config: &AppConfig,
        question_provider: Arc<dyn QuestionProvider>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        let event_bus = EventBus::new(config.event_channel_capacity);
        let player_directory: Arc<dyn PlayerDirectory> = Arc::new(InMemoryPlayerDirectory::new());
        let room_repository = Arc::new(InMemoryRoomRepository::new());
        let match_repository = Arc::new(InMemoryMatchRepository::new());
        let progression_repository = Arc::new(InMemoryProgressionRepository::new());

        let room_service = Arc::new(RoomService::new(
            room_repository.clone(),
            player_directory.clone(),
            event_bus.clone(),
        ));

        let settlement_service = Arc::new(SettlementService::new(
            room_repository.clone(),
            progression_repository.clone(),
            player_directory.clone(),
            event_bus.clone(),
        ));

        let match_service = Arc::new(MatchService::new(
            room_repository,
            match_repository.clone(),
            progression_repository.clone(),
            question_provider,
            settlement_service,
            event_bus.clone(),
            config.provider_timeout,
        ));

        let progression_service = Arc::new(ProgressionService::new(
            match_repository,
            progression_repository,
            player_directory.clone(),
            event_bus.clone(),
        ));

        let channel_subscriber = Arc::new(WebSocketChannelSubscriber::new(
            connection_manager.clone(),
            event_bus.clone(),
        ));

        Self {
            room_service,
            match_service,
            progression_service,
            player_directory,
            connection_manager,
            channel_subscriber,
            token_config: TokenConfig::new(
                config.jwt_secret.clone(),
                config.session_expiration_days,
            ),
            event_bus,
        }
    }
}

/// Sub-kinds of [`AppError::Conflict`] so callers can tell apart the
/// different state clashes without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The player already answered every question of the match
    AlreadyComplete,
    /// The room is locked because its match has started
    MatchAlreadyStarted,
    /// A concurrent submission moved the cursor first
    StaleCursor,
    /// The match has been ended by the host
    MatchOver,
    /// A record with the same identity already exists
    Duplicate,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict { kind: ConflictKind, message: String },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn conflict(kind: ConflictKind, message: impl Into<String>) -> Self {
        AppError::Conflict {
            kind,
            message: message.into(),
        }
    }

    /// Returns the conflict kind if this is a conflict error
    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            AppError::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict { message, .. } => (StatusCode::CONFLICT, message),
            AppError::UpstreamUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
