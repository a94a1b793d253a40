// Public API
pub use channel_subscriber::{ChannelKind, WebSocketChannelSubscriber};
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, WebsocketReceiveHandler};
pub use messages::{ClientMessage, ServerMessage};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod channel_subscriber;
mod connection_manager;
mod handler;
mod messages;
mod socket;
