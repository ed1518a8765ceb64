//! Environment-driven configuration.

pub mod arena;
pub mod env;
pub mod server;

pub use arena::{ArenaConfig, ClockStart, DurationRange, GameConfig, MatchmakingConfig};
pub use server::ServerConfig;
