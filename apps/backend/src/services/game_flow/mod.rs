//! Game flow: the move pipeline, AI move scheduling and game endings.
//!
//! All three are methods on [`Arena`](super::arena::Arena), implemented
//! across the submodules below.

mod ai_coordinator;
pub(crate) mod game_end;
mod pipeline;

use crate::domain::GameOutcome;

/// What happened to a submitted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Recorded and the turn passed to the opponent.
    Applied,
    /// Recorded and the position is terminal; the session is finalized.
    Finished(GameOutcome),
    /// Dropped without touching the session.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoSession,
    SessionEnded,
    NotYourTurn,
}

impl MoveOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, MoveOutcome::Ignored(_))
    }
}
