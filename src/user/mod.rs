// Public API - what other modules can use
pub use directory::{DirectoryError, InMemoryPlayerDirectory, PlayerDirectory};
pub use models::{PlayerProfile, PlayerRecord};

// Internal modules
mod directory;
mod models;
