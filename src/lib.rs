// Library crate for the trivia match server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod matches;
pub mod progression;
pub mod question;
pub mod room;
pub mod routes;
pub mod session;
pub mod settlement;
pub mod shared;
pub mod user;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use event::{EventBus, MatchEvent, RoomEvent};
pub use room::{RoomModel, RoomRepository};
pub use shared::{AppError, AppState, ConflictKind};
pub use websockets::{
    ClientMessage, ConnectionManager, MessageHandler, ServerMessage, WebSocketChannelSubscriber,
    WebsocketReceiveHandler,
};
