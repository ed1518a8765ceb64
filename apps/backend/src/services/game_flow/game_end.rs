use tokio::time::Instant;
use tracing::info;

use crate::domain::{GameOutcome, PlayerId};
use crate::services::arena::Arena;
use crate::services::sessions::{AiOpponent, Session, SessionState};
use crate::ws::ServerMsg;

impl Arena {
    /// End `session` with `outcome`. Returns `false` if it had already
    /// ended; the first caller wins and every later call is a no-op.
    pub fn handle_game_end(
        &self,
        session: &Session,
        responsible: Option<PlayerId>,
        outcome: GameOutcome,
    ) -> bool {
        let released = {
            let mut state = session.lock();
            finalize(&mut state, session, responsible, outcome)
        };

        match released {
            Some(players) => {
                self.registry.release_players(session.id(), &players);
                true
            }
            None => false,
        }
    }

    /// End `session` against `leaver` if no clock has started yet. Once a
    /// clock runs the timeout settles the game, so a live clock makes this
    /// a no-op.
    pub(crate) fn abandon_if_idle(&self, session: &Session, leaver: PlayerId) -> bool {
        let released = {
            let mut state = session.lock();
            if state.ended || !state.clocks_idle() {
                return false;
            }
            let Some(color) = state.seat_of(leaver).map(|seat| seat.color) else {
                return false;
            };
            info!(session_id = %session.id(), player_id = %leaver, %color, "player left before any clock ran");
            finalize(&mut state, session, Some(leaver), GameOutcome::abandoned(color))
        };

        match released {
            Some(players) => {
                self.registry.release_players(session.id(), &players);
                true
            }
            None => false,
        }
    }
}

/// Tear the session down under its lock: stop both clocks, announce the
/// result, close transports and clear the seats. Returns the players to
/// unlink from the registry once the lock is released, or `None` if the
/// session was already over.
pub(crate) fn finalize(
    state: &mut SessionState,
    session: &Session,
    responsible: Option<PlayerId>,
    outcome: GameOutcome,
) -> Option<Vec<PlayerId>> {
    if state.ended {
        return None;
    }
    state.ended = true;
    state.ended_at = Some(Instant::now());
    state.active = None;

    for seat in state.seats() {
        seat.clock.stop();
    }

    let ai_meta = state.seats().find_map(|seat| seat.ai()).map(AiOpponent::meta);
    state.broadcast(&ServerMsg::GameEnded {
        room_id: session.id(),
        result: outcome.result,
        reason: outcome.termination.reason(),
        is_ai: session.is_ai(),
        ai_meta,
    });

    let seats = state.take_seats();
    for seat in &seats {
        seat.close();
    }

    info!(
        session_id = %session.id(),
        result = %outcome.result,
        reason = outcome.termination.reason(),
        responsible = ?responsible,
        moves = state.moves.len(),
        "game ended"
    );

    Some(seats.iter().map(|seat| seat.player_id).collect())
}
