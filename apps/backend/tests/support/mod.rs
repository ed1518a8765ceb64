#![allow(dead_code)]

pub mod engines;
pub mod transport;
pub mod websocket;

pub use arena::{
    build_arena, build_arena_with_rules, connect, pair_humans, test_config, HumanGame,
};
pub use engines::{FailingFactory, FailingMoveFactory, ScriptedFactory, SlowFactory};
pub use rules::CountingRules;
pub use transport::RecordingTransport;
