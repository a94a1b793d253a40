// Public API - what other modules can use
pub use ranking::{rank_and_split, Standings};
pub use service::{SettlementReport, SettlementService};

// Internal modules
mod ranking;
mod service;
