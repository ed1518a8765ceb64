//! Matchmaking and session engine.

pub mod arena;
pub mod game_flow;
pub mod matchmaking;
pub mod sessions;
pub mod turn_clock;

pub use arena::Arena;
pub use game_flow::{IgnoreReason, MoveOutcome};
pub use matchmaking::WaitingPool;
pub use sessions::{AiOpponent, Player, Seat, SeatKind, Session, SessionRegistry, SessionSummary};
pub use turn_clock::{ClockError, ClockPhase, ClockSnapshot, TurnClock};
