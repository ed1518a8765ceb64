use std::fmt;

use serde::{Deserialize, Serialize};

use super::Color;

/// Final score of a game in the usual notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWon,
    #[serde(rename = "0-1")]
    BlackWon,
    #[serde(rename = "1/2-1/2")]
    Draw,
}

impl GameResult {
    pub const fn win_for(color: Color) -> Self {
        match color {
            Color::White => GameResult::WhiteWon,
            Color::Black => GameResult::BlackWon,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            GameResult::WhiteWon => "1-0",
            GameResult::BlackWon => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a game reached its result. Rendered as the `reason` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Timeout,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FivefoldRepetition,
    SeventyFiveMoveRule,
    /// A player left before any clock was running.
    Abandoned,
}

impl Termination {
    pub const fn reason(self) -> &'static str {
        match self {
            Termination::Timeout => "Time is up",
            Termination::Checkmate => "Checkmate",
            Termination::Stalemate => "Stalemate",
            Termination::InsufficientMaterial => "InsufficientMaterial",
            Termination::FivefoldRepetition => "FivefoldRepetition",
            Termination::SeventyFiveMoveRule => "SeventyFiveMoveRule",
            Termination::Abandoned => "Opponent left",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOutcome {
    pub result: GameResult,
    pub termination: Termination,
}

impl GameOutcome {
    /// Outcome when `expired`'s clock runs out. Derived from the surviving
    /// color so the seat that fired the callback never decides the sign.
    pub const fn timeout(expired: Color) -> Self {
        Self {
            result: GameResult::win_for(expired.opponent()),
            termination: Termination::Timeout,
        }
    }

    /// Outcome when `leaver` walks away from a game no clock can decide.
    pub const fn abandoned(leaver: Color) -> Self {
        Self {
            result: GameResult::win_for(leaver.opponent()),
            termination: Termination::Abandoned,
        }
    }
}
