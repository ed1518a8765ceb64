//! Computer opponents.
//!
//! This module provides:
//! - the `MoveEngine` / `EngineFactory` seam the session core talks to
//! - a UCI subprocess adapter and a random-move engine
//! - rating to skill-level mapping
//! - a static registry selecting the engine by name

mod config;
pub mod random;
pub mod registry;
pub mod strength;
mod trait_def;
pub mod uci;

pub use config::AiConfig;
pub use random::{RandomEngine, RandomEngineFactory};
pub use strength::{Strength, SKILL_TABLE};
pub use trait_def::{EngineError, EngineFactory, MoveEngine};
pub use uci::{UciEngine, UciEngineFactory};
