// Public API - what other modules can use
pub use handlers::{create_room, get_roster, list_rooms};
pub use models::{RoomModel, RoomStatus};
pub use repository::{JoinRoomResult, RoomRepository, StatusTransitionResult};
pub use service::RoomService;
pub use types::{JoinOutcome, RoomCreateRequest, RoomResponse, RosterResponse};

// Internal modules
mod handlers;
mod models;
pub mod repository;
mod service;
mod types;
