#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod ai;
pub mod config;
pub mod domain;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod ws;


// Re-exports for public API
pub use config::{ArenaConfig, ServerConfig};
pub use error::AppError;
pub use services::{Arena, MoveOutcome, Player};
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
