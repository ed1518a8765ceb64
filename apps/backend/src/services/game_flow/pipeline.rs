use std::sync::Arc;

use tracing::{debug, info, warn};

use super::game_end::finalize;
use super::{IgnoreReason, MoveOutcome};
use crate::config::ClockStart;
use crate::domain::{Color, PlayerId};
use crate::services::arena::Arena;
use crate::services::sessions::{AiOpponent, SessionState};
use crate::ws::ServerMsg;

impl Arena {
    /// Record `mv` for `player_id` and pass the turn.
    ///
    /// Moves from players without a live session, or out of turn, are
    /// dropped without touching anything. Legality is not checked here; the
    /// rules engine only classifies the resulting history.
    pub fn process_move(
        self: &Arc<Self>,
        player_id: PlayerId,
        mv: &str,
        is_first_move: bool,
    ) -> MoveOutcome {
        let Some(session) = self.registry.session_for(player_id) else {
            debug!(player_id = %player_id, mv, "move without a session ignored");
            return MoveOutcome::Ignored(IgnoreReason::NoSession);
        };
        let session_id = session.id();

        let (outcome, released, next_ai) = {
            let mut state = session.lock();
            if state.ended {
                debug!(session_id = %session_id, player_id = %player_id, "move on ended session ignored");
                return MoveOutcome::Ignored(IgnoreReason::SessionEnded);
            }
            let Some(mover) = state.seat_of(player_id).map(|seat| seat.color) else {
                return MoveOutcome::Ignored(IgnoreReason::NoSession);
            };
            if state.active != Some(mover) {
                debug!(session_id = %session_id, player_id = %player_id, mv, "out-of-turn move ignored");
                return MoveOutcome::Ignored(IgnoreReason::NotYourTurn);
            }

            let next = mover.opponent();
            if let Some(opponent) = state.seat(next) {
                opponent.send(&ServerMsg::OpponentMoved {
                    room_id: session_id,
                    mv: mv.to_string(),
                });
            }
            state.moves.push(mv.to_string());
            state.active = Some(next);
            debug!(session_id = %session_id, %mover, mv, ply = state.moves.len(), "move applied");

            let verdict = if state.unclassifiable {
                None
            } else {
                match self.rules.classify(&state.moves) {
                    Ok(verdict) => verdict,
                    Err(err) => {
                        // Every later history contains the same bad move.
                        warn!(
                            session_id = %session_id,
                            error = %err,
                            "rules engine rejected history; only clocks can end this game now"
                        );
                        state.unclassifiable = true;
                        None
                    }
                }
            };

            match verdict {
                Some(outcome) => {
                    info!(
                        session_id = %session_id,
                        reason = outcome.termination.reason(),
                        "terminal position reached"
                    );
                    let released = finalize(&mut state, &session, Some(player_id), outcome);
                    (MoveOutcome::Finished(outcome), released, None)
                }
                None => {
                    if let Some(seat) = state.seat(next) {
                        seat.send(&ServerMsg::YourTurn {
                            room_id: session_id,
                        });
                    }
                    self.flip_clocks(&state, mover, next, is_first_move);
                    (MoveOutcome::Applied, None, ai_to_move(&state, next))
                }
            }
        };

        if let Some(players) = released {
            self.registry.release_players(session_id, &players);
        }
        if let Some((ai_id, ai)) = next_ai {
            self.spawn_ai_turn(session, ai_id, ai, false);
        }
        outcome
    }

    /// Hand the running clock from `mover` to `next`. At most one clock of
    /// the session runs afterwards.
    fn flip_clocks(&self, state: &SessionState, mover: Color, next: Color, is_first_move: bool) {
        let (Some(mover_seat), Some(next_seat)) = (state.seat(mover), state.seat(next)) else {
            return;
        };

        if !mover_seat.clock.is_started() && !next_seat.clock.is_started() {
            if self.config.game.clock_start == ClockStart::ClientSignalled && !is_first_move {
                return;
            }
            if let Err(err) = next_seat.clock.start() {
                debug!(error = %err, color = %next, "could not start clock");
            }
            return;
        }

        if let Err(err) = mover_seat.clock.pause() {
            debug!(error = %err, color = %mover, "could not pause clock");
        }
        let handed_over = if next_seat.clock.is_started() {
            next_seat.clock.resume()
        } else {
            next_seat.clock.start()
        };
        if let Err(err) = handed_over {
            debug!(error = %err, color = %next, "could not hand clock over");
        }
    }
}

fn ai_to_move(state: &SessionState, color: Color) -> Option<(PlayerId, AiOpponent)> {
    let seat = state.seat(color)?;
    seat.ai().map(|ai| (seat.player_id, ai.clone()))
}
