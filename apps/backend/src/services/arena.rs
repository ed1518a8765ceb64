//! The arena: one injectable instance owning the waiting pool, the session
//! registry, configuration and the rules/engine collaborators.
//!
//! Behaviour is spread over sibling modules the way the game flow service
//! is: matchmaking in `matchmaking.rs`, moves and endings in `game_flow/`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::game_flow::game_end;
use super::matchmaking::WaitingPool;
use super::sessions::{Seat, SeatKind, SessionRegistry};
use super::turn_clock::TurnClock;
use crate::ai::EngineFactory;
use crate::config::{ArenaConfig, ClockStart};
use crate::domain::{Color, GameOutcome, PlayerId, RulesEngine, SessionId};
use crate::ws::ServerMsg;

const MAX_JANITOR_PERIOD: Duration = Duration::from_secs(60);

pub struct Arena {
    pub(crate) config: ArenaConfig,
    pub(crate) pool: Mutex<WaitingPool>,
    pub(crate) registry: SessionRegistry,
    pub(crate) engines: Arc<dyn EngineFactory>,
    pub(crate) rules: Arc<dyn RulesEngine>,
}

impl Arena {
    pub fn new(
        config: ArenaConfig,
        engines: Arc<dyn EngineFactory>,
        rules: Arc<dyn RulesEngine>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            pool: Mutex::new(WaitingPool::default()),
            registry: SessionRegistry::new(),
            engines,
            rules,
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn engine_name(&self) -> &str {
        self.engines.name()
    }

    pub fn waiting_count(&self) -> usize {
        self.pool.lock().len()
    }

    pub fn is_waiting(&self, player_id: PlayerId) -> bool {
        self.pool.lock().contains(player_id)
    }

    /// Periodically drop ended sessions older than the retention window.
    /// The task exits once the arena is gone.
    pub fn spawn_janitor(self: &Arc<Self>) -> JoinHandle<()> {
        let retention = self.config.game.retention;
        let period = retention.clamp(Duration::from_secs(1), MAX_JANITOR_PERIOD);
        let weak = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(arena) = weak.upgrade() else {
                    return;
                };
                let pruned = arena.registry.prune_ended(retention);
                if pruned > 0 {
                    info!(pruned, remaining = arena.registry.len(), "pruned ended sessions");
                }
            }
        })
    }

    pub(crate) fn new_clock(self: &Arc<Self>, session_id: SessionId, color: Color) -> TurnClock {
        let weak: Weak<Arena> = Arc::downgrade(self);
        TurnClock::new(self.config.game.duration_secs, move |remaining| {
            if let Some(arena) = weak.upgrade() {
                arena.on_clock_tick(session_id, color, remaining);
            }
        })
    }

    pub(crate) fn seat(
        self: &Arc<Self>,
        session_id: SessionId,
        player_id: PlayerId,
        color: Color,
        kind: SeatKind,
    ) -> Seat {
        Seat {
            player_id,
            color,
            clock: self.new_clock(session_id, color),
            kind,
        }
    }

    /// Broadcast the new remaining time; at zero the owner of the clock
    /// loses on time.
    fn on_clock_tick(&self, session_id: SessionId, color: Color, remaining: u32) {
        let Some(session) = self.registry.get(session_id) else {
            return;
        };

        let released = {
            let mut state = session.lock();
            if state.ended {
                debug!(session_id = %session_id, "tick on ended session ignored");
                return;
            }

            state.broadcast(&ServerMsg::ClockTick {
                room_id: session_id,
                color,
                remaining_secs: remaining,
            });

            if remaining > 0 {
                return;
            }

            info!(session_id = %session_id, %color, "clock expired");
            let responsible = state.seat(color).map(|seat| seat.player_id);
            game_end::finalize(
                &mut state,
                &session,
                responsible,
                GameOutcome::timeout(color),
            )
        };

        if let Some(players) = released {
            self.registry.release_players(session_id, &players);
        }
    }

    /// Start white's clock at pairing when the policy asks for it.
    pub(crate) fn apply_match_clock_policy(&self, seats: &[&Seat]) {
        if self.config.game.clock_start != ClockStart::OnMatch {
            return;
        }
        if let Some(white) = seats.iter().find(|seat| seat.color == Color::White) {
            if let Err(err) = white.clock.start() {
                debug!(error = %err, "white clock already running at match time");
            }
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.config)
            .field("engine", &self.engines.name())
            .finish_non_exhaustive()
    }
}
