use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::PlayerId;
use crate::services::arena::Arena;
use crate::services::sessions::{AiOpponent, Session};

impl Arena {
    /// Ask the AI for its next move in the background and feed the answer
    /// through the pipeline. The opening move of an AI playing white uses
    /// full depth and no thinking delay.
    pub(crate) fn spawn_ai_turn(
        self: &Arc<Self>,
        session: Arc<Session>,
        ai_id: PlayerId,
        ai: AiOpponent,
        opening: bool,
    ) {
        let arena = Arc::clone(self);
        tokio::spawn(async move {
            arena.play_ai_turn(session, ai_id, ai, opening).await;
        });
    }

    async fn play_ai_turn(
        self: Arc<Self>,
        session: Arc<Session>,
        ai_id: PlayerId,
        ai: AiOpponent,
        opening: bool,
    ) {
        let max_depth = self.config.ai.max_depth.max(1);
        let (think, depth) = if opening {
            (Duration::ZERO, max_depth)
        } else {
            let mut rng = rand::rng();
            let think = self.config.ai.think.draw(&mut rng);
            (think, rng.random_range(1..=max_depth))
        };

        if !think.is_zero() {
            sleep(think).await;
        }

        let Some(history) = session.history_for(ai_id) else {
            debug!(session_id = %session.id(), "session ended while the AI was thinking");
            return;
        };

        match ai.engine.best_move(&history, depth).await {
            Ok(mv) => {
                let outcome = self.process_move(ai_id, &mv, opening);
                debug!(session_id = %session.id(), mv = %mv, depth, ?outcome, "AI moved");
            }
            Err(err) => {
                warn!(
                    session_id = %session.id(),
                    depth,
                    error = %err,
                    "AI move generation failed; move dropped"
                );
                self.keep_ai_clock_running(&session, ai_id);
            }
        }
    }

    /// After a failed AI move the turn stays with the AI. Make sure its clock
    /// is counting so the stall ends in a timeout instead of hanging.
    fn keep_ai_clock_running(&self, session: &Session, ai_id: PlayerId) {
        let state = session.lock();
        if state.ended {
            return;
        }
        let Some(seat) = state.seat_of(ai_id) else {
            return;
        };
        if state.active != Some(seat.color) {
            return;
        }

        let result = if seat.clock.is_started() {
            seat.clock.resume()
        } else {
            seat.clock.start()
        };
        match result {
            Ok(()) => info!(session_id = %session.id(), "AI clock left running after failure"),
            Err(err) => debug!(session_id = %session.id(), error = %err, "AI clock not restarted"),
        }
    }
}
