pub mod config;
pub mod core;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{ReceptionistMode, ServerConfig};
pub use core::*;
pub use state::AppState;
