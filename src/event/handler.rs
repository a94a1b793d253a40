use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when handling channel events
#[derive(Debug, Error)]
pub enum ChannelEventError {
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Handler error: {0}")]
    HandlerError(String),
}

/// Trait for components that react to events of one channel family
/// (room or match) without being tied to WebSocket specifics.
#[async_trait]
pub trait ChannelEventHandler<E: Send + 'static>: Send + Sync {
    async fn handle_event(&self, channel_id: &str, event: E) -> Result<(), ChannelEventError>;

    /// Get a human-readable name for this handler (for logging/debugging)
    fn handler_name(&self) -> &'static str;
}
