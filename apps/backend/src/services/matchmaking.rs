//! Waiting pool and opponent search.
//!
//! Every new player gets one search task. With the configured probability
//! it waits a random delay and is paired with an AI; otherwise it polls the
//! pool for another human until the opponent timeout, then falls back to an
//! AI. Both players of a human pairing leave the pool under one pool lock,
//! and a player is claimed exactly once, so no player lands in two sessions.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::arena::Arena;
use super::sessions::{AiOpponent, Player, SeatKind};
use crate::ai::Strength;
use crate::domain::{Color, PlayerId};
use crate::ws::ServerMsg;

/// Players waiting for a human opponent plus the cancel handles of every
/// running search.
#[derive(Default)]
pub struct WaitingPool {
    waiting: HashMap<PlayerId, Arc<Player>>,
    searches: HashMap<PlayerId, CancellationToken>,
}

impl WaitingPool {
    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.waiting.contains_key(&player_id)
    }

    /// Returns `false` if the player was already queued.
    pub fn insert(&mut self, player: Arc<Player>) -> bool {
        let id = player.id();
        if self.waiting.contains_key(&id) {
            return false;
        }
        self.waiting.insert(id, player);
        true
    }

    pub fn remove(&mut self, player_id: PlayerId) -> Option<Arc<Player>> {
        self.waiting.remove(&player_id)
    }

    /// Any queued player other than `player_id`.
    pub fn find_other(&self, player_id: PlayerId) -> Option<Arc<Player>> {
        self.waiting
            .iter()
            .find(|(id, _)| **id != player_id)
            .map(|(_, player)| Arc::clone(player))
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}

enum Poll {
    /// Someone else paired this player; the search is over.
    AlreadyClaimed,
    Matched(Arc<Player>),
    Queued,
}

impl Arena {
    /// Start looking for an opponent. Returns immediately.
    pub fn find_opponent(self: &Arc<Self>, player: Arc<Player>) {
        let token = CancellationToken::new();
        self.pool.lock().searches.insert(player.id(), token.clone());

        let arena = Arc::clone(self);
        tokio::spawn(async move {
            let player_id = player.id();
            arena.run_search(player, token).await;
            arena.pool.lock().searches.remove(&player_id);
        });
    }

    /// Withdraw a departing player. A queued or still-searching player is
    /// removed and claimed so no pairing can pick it up later. A seated
    /// player is left to the clocks once one is running; before that the
    /// game is ended against them.
    pub fn leave(&self, player: &Player) {
        let player_id = player.id();
        player.mark_departed();
        let (was_waiting, search) = {
            let mut pool = self.pool.lock();
            let was_waiting = pool.remove(player_id).is_some();
            let search = pool.searches.remove(&player_id);
            if search.is_some() || was_waiting {
                player.try_claim();
            }
            (was_waiting, search)
        };

        if let Some(token) = search {
            token.cancel();
        }

        // Registry after the pool lock; the two are never held together.
        if let Some(session) = self.registry.session_for(player_id) {
            self.abandon_if_idle(&session, player_id);
        }
        debug!(player_id = %player_id, was_waiting, "player left matchmaking");
    }

    async fn run_search(self: &Arc<Self>, player: Arc<Player>, token: CancellationToken) {
        let config = &self.config.matchmaking;
        let (straight_to_ai, delay) = {
            let mut rng = rand::rng();
            let straight = rng.random_bool(config.ai_probability.clamp(0.0, 1.0));
            (straight, config.ai_wait.draw(&mut rng))
        };

        if straight_to_ai {
            debug!(player_id = %player.id(), ?delay, "scheduling AI opponent");
            tokio::select! {
                _ = token.cancelled() => return,
                _ = sleep(delay) => {}
            }
            if self.claim(&player) {
                self.pair_with_ai(player).await;
            }
            return;
        }

        self.search_for_human(player, token).await;
    }

    async fn search_for_human(self: &Arc<Self>, player: Arc<Player>, token: CancellationToken) {
        let config = &self.config.matchmaking;
        let deadline = sleep(config.opponent_timeout);
        tokio::pin!(deadline);
        let mut ticker = interval_at(Instant::now() + config.poll_interval, config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = &mut deadline => break,
                _ = ticker.tick() => {}
            }

            match self.poll_pool(&player) {
                Poll::AlreadyClaimed => return,
                Poll::Matched(opponent) => {
                    self.pair_humans(player, opponent);
                    return;
                }
                Poll::Queued => {
                    debug!(
                        player_id = %player.id(),
                        waiting = self.waiting_count(),
                        "looking for an opponent"
                    );
                }
            }
        }

        info!(player_id = %player.id(), "no human opponent in time, falling back to AI");
        if self.claim(&player) {
            self.pair_with_ai(player).await;
        }
    }

    fn poll_pool(&self, player: &Arc<Player>) -> Poll {
        // Registry is consulted before the pool lock; the two are never
        // held together.
        if self.registry.contains_player(player.id()) {
            return Poll::AlreadyClaimed;
        }

        let mut pool = self.pool.lock();
        if player.is_claimed() {
            pool.remove(player.id());
            return Poll::AlreadyClaimed;
        }

        if let Some(opponent) = pool.find_other(player.id()) {
            pool.remove(opponent.id());
            pool.remove(player.id());
            let ours = player.try_claim();
            let theirs = opponent.try_claim();
            debug_assert!(ours && theirs, "pooled players are unclaimed");
            if let Some(search) = pool.searches.get(&opponent.id()) {
                search.cancel();
            }
            return Poll::Matched(opponent);
        }

        pool.insert(Arc::clone(player));
        Poll::Queued
    }

    /// Take the player out of matchmaking for an AI pairing. Fails if a
    /// human pairing or a departure got there first.
    fn claim(&self, player: &Player) -> bool {
        let mut pool = self.pool.lock();
        pool.remove(player.id());
        player.try_claim()
    }

    pub(crate) fn pair_humans(self: &Arc<Self>, a: Arc<Player>, b: Arc<Player>) {
        let color_a = Color::coin_flip(&mut rand::rng());
        let color_b = color_a.opponent();

        let session = self.registry.create(false, |id| {
            [
                self.seat(id, a.id(), color_a, SeatKind::Human(Arc::clone(a.transport()))),
                self.seat(id, b.id(), color_b, SeatKind::Human(Arc::clone(b.transport()))),
            ]
        });

        let state = session.lock();
        for seat in state.seats() {
            seat.send(&ServerMsg::Matched {
                room_id: session.id(),
                color: seat.color,
                game_duration_secs: self.config.game.duration_secs,
            });
        }
        self.apply_match_clock_policy(&state.seats().collect::<Vec<_>>());
        drop(state);

        info!(
            session_id = %session.id(),
            player_a = %a.id(),
            player_b = %b.id(),
            "matched two players"
        );

        // `leave` checks the registry after flagging the departure, so a
        // player who left while the session was being built is caught here.
        for player in [&a, &b] {
            if player.has_departed() {
                self.abandon_if_idle(&session, player.id());
            }
        }
    }

    pub(crate) async fn pair_with_ai(self: &Arc<Self>, player: Arc<Player>) {
        let strength = Strength::draw(&mut rand::rng(), self.config.ai.rating.clone());
        let engine = match self.engines.spawn(strength.level).await {
            Ok(engine) => engine,
            Err(err) => {
                error!(
                    player_id = %player.id(),
                    level = strength.level,
                    error = %err,
                    "failed to start AI opponent"
                );
                player.transport().close();
                return;
            }
        };
        if player.has_departed() {
            debug!(player_id = %player.id(), "player left while the engine was starting");
            return;
        }

        let human_color = Color::coin_flip(&mut rand::rng());
        let ai_color = human_color.opponent();
        let ai_id = PlayerId::new();
        let opponent = AiOpponent {
            engine,
            strength,
            engine_name: self.engines.name().to_string(),
        };
        let first_mover = (ai_color == Color::White).then(|| opponent.clone());

        let session = self.registry.create(true, |id| {
            [
                self.seat(
                    id,
                    player.id(),
                    human_color,
                    SeatKind::Human(Arc::clone(player.transport())),
                ),
                self.seat(id, ai_id, ai_color, SeatKind::Ai(opponent)),
            ]
        });

        {
            let state = session.lock();
            if let Some(seat) = state.seat(human_color) {
                seat.send(&ServerMsg::Matched {
                    room_id: session.id(),
                    color: human_color,
                    game_duration_secs: self.config.game.duration_secs,
                });
            }
            self.apply_match_clock_policy(&state.seats().collect::<Vec<_>>());
        }

        info!(
            session_id = %session.id(),
            player_id = %player.id(),
            %human_color,
            rank = strength.rank,
            "matched player with AI"
        );

        if player.has_departed() && self.abandon_if_idle(&session, player.id()) {
            return;
        }
        if let Some(ai) = first_mover {
            self.spawn_ai_turn(session, ai_id, ai, true);
        }
    }
}
