// Event-driven plumbing between services and connected players
//
// Services emit onto keyed broadcast channels (one per room, one per match);
// subscriptions forward each channel's events to a handler task.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::{MatchEvent, RoomEvent};
pub use handler::{ChannelEventError, ChannelEventHandler};
pub use subscription::ChannelSubscription;

// Internal modules
mod bus;
mod events;
mod handler;
mod subscription;
