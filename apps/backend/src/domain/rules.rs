//! Rules engine seam.
//!
//! The session core never validates moves itself; it hands the full move
//! log to a [`RulesEngine`] after every accepted move and finalizes the game
//! when the engine reports a terminal position.

use std::collections::HashMap;

use shakmaty::uci::UciMove;
use shakmaty::{Bitboard, Chess, Color as ChessColor, EnPassantMode, Position, Role, Square};
use thiserror::Error;

use super::{Color, GameOutcome, GameResult, Termination};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("move {index} ({notation}) is not UCI notation")]
    Notation { index: usize, notation: String },
    #[error("move {index} ({notation}) is illegal in the current position")]
    Illegal { index: usize, notation: String },
}

/// Classifies a move history as terminal or not.
pub trait RulesEngine: Send + Sync {
    /// `Ok(None)` means the game goes on.
    fn classify(&self, moves: &[String]) -> Result<Option<GameOutcome>, RulesError>;
}

/// Standard chess from the initial position, moves in UCI notation.
///
/// Only the automatic terminations are reported; claimable draws
/// (threefold, fifty-move) need a player action this protocol does not carry.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardRules;

impl RulesEngine for StandardRules {
    fn classify(&self, moves: &[String]) -> Result<Option<GameOutcome>, RulesError> {
        let mut pos = Chess::default();
        let mut seen: HashMap<RepetitionKey, u8> = HashMap::new();
        seen.insert(RepetitionKey::of(&pos), 1);

        for (index, notation) in moves.iter().enumerate() {
            play(&mut pos, index, notation)?;
            let repeats = {
                let count = seen.entry(RepetitionKey::of(&pos)).or_default();
                *count += 1;
                *count
            };
            if let Some(outcome) = terminal(&pos, repeats) {
                return Ok(Some(outcome));
            }
        }

        Ok(None)
    }
}

/// Replay a move history from the initial position.
pub fn replay<'a, I>(moves: I) -> Result<Chess, RulesError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut pos = Chess::default();
    for (index, notation) in moves.into_iter().enumerate() {
        play(&mut pos, index, notation)?;
    }
    Ok(pos)
}

fn play(pos: &mut Chess, index: usize, notation: &str) -> Result<(), RulesError> {
    let uci: UciMove = notation.parse().map_err(|_| RulesError::Notation {
        index,
        notation: notation.to_string(),
    })?;
    let chess_move = uci.to_move(&*pos).map_err(|_| RulesError::Illegal {
        index,
        notation: notation.to_string(),
    })?;
    pos.play_unchecked(&chess_move);
    Ok(())
}

fn terminal(pos: &Chess, repeats: u8) -> Option<GameOutcome> {
    if pos.is_checkmate() {
        // The side to move is mated.
        let winner = match pos.turn() {
            ChessColor::White => Color::Black,
            ChessColor::Black => Color::White,
        };
        return Some(GameOutcome {
            result: GameResult::win_for(winner),
            termination: Termination::Checkmate,
        });
    }

    let termination = if pos.is_stalemate() {
        Termination::Stalemate
    } else if pos.is_insufficient_material() {
        Termination::InsufficientMaterial
    } else if repeats >= 5 {
        Termination::FivefoldRepetition
    } else if pos.halfmoves() >= 150 {
        Termination::SeventyFiveMoveRule
    } else {
        return None;
    };

    Some(GameOutcome {
        result: GameResult::Draw,
        termination,
    })
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct RepetitionKey {
    by_color: [Bitboard; 2],
    by_role: [Bitboard; 6],
    turn: ChessColor,
    castling: Bitboard,
    ep_square: Option<Square>,
}

impl RepetitionKey {
    fn of(pos: &Chess) -> Self {
        let board = pos.board();
        Self {
            by_color: [
                board.by_color(ChessColor::White),
                board.by_color(ChessColor::Black),
            ],
            by_role: Role::ALL.map(|role| board.by_role(role)),
            turn: pos.turn(),
            castling: pos.castles().castling_rights(),
            ep_square: pos.ep_square(EnPassantMode::Legal),
        }
    }
}
