//! Sessions (rooms) and the registry that indexes them.
//!
//! A [`Session`] owns two seats, the move log and the active-turn pointer,
//! all behind one session-local mutex. The [`SessionRegistry`] maps room ids
//! to sessions and players to the room they currently play in. The registry
//! lock is never taken while a session lock is held.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::ai::{MoveEngine, Strength};
use crate::domain::{Color, PlayerId, SessionId};
use crate::services::turn_clock::{ClockSnapshot, TurnClock};
use crate::ws::{AiMeta, ServerMsg, Transport};

/// A connected human, from the moment the socket opens until it closes.
pub struct Player {
    id: PlayerId,
    transport: Arc<dyn Transport>,
    /// Set once the player has been taken out of matchmaking by a pairing
    /// (with a human or an AI). Flipped only under the pool lock.
    claimed: AtomicBool,
    departed: AtomicBool,
}

impl Player {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_id(PlayerId::new(), transport)
    }

    pub fn with_id(id: PlayerId, transport: Arc<dyn Transport>) -> Self {
        Self {
            id,
            transport,
            claimed: AtomicBool::new(false),
            departed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// True once the connection has gone away.
    pub fn has_departed(&self) -> bool {
        self.departed.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_departed(&self) {
        self.departed.store(true, Ordering::SeqCst);
    }

    /// Returns `false` if someone else got there first.
    pub(crate) fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("claimed", &self.is_claimed())
            .field("departed", &self.has_departed())
            .finish()
    }
}

/// Computer side of an AI session.
#[derive(Clone)]
pub struct AiOpponent {
    pub engine: Arc<dyn MoveEngine>,
    pub strength: Strength,
    pub engine_name: String,
}

impl AiOpponent {
    pub fn meta(&self) -> AiMeta {
        AiMeta {
            rank: self.strength.rank,
            engine: self.engine_name.clone(),
        }
    }
}

pub enum SeatKind {
    Human(Arc<dyn Transport>),
    Ai(AiOpponent),
}

/// One side of the board.
pub struct Seat {
    pub player_id: PlayerId,
    pub color: Color,
    pub clock: TurnClock,
    pub kind: SeatKind,
}

impl Seat {
    pub fn is_ai(&self) -> bool {
        matches!(self.kind, SeatKind::Ai(_))
    }

    pub fn ai(&self) -> Option<&AiOpponent> {
        match &self.kind {
            SeatKind::Ai(ai) => Some(ai),
            SeatKind::Human(_) => None,
        }
    }

    /// Best effort; AI seats have nobody to talk to.
    pub fn send(&self, msg: &ServerMsg) {
        if let SeatKind::Human(transport) = &self.kind {
            if let Err(err) = transport.send(msg) {
                warn!(
                    player_id = %self.player_id,
                    state = msg.state(),
                    error = %err,
                    "failed to deliver message"
                );
            }
        }
    }

    pub fn close(&self) {
        if let SeatKind::Human(transport) = &self.kind {
            transport.close();
        }
    }
}

/// Mutable part of a session. Only reachable through [`Session::lock`].
pub struct SessionState {
    /// Indexed by color: white first.
    pub(crate) seats: [Option<Seat>; 2],
    pub(crate) moves: Vec<String>,
    pub(crate) active: Option<Color>,
    pub(crate) ended: bool,
    pub(crate) ended_at: Option<Instant>,
    /// Set after the rules engine rejected the history; it is not asked
    /// again for this game.
    pub(crate) unclassifiable: bool,
}

const fn slot(color: Color) -> usize {
    match color {
        Color::White => 0,
        Color::Black => 1,
    }
}

impl SessionState {
    pub fn seat(&self, color: Color) -> Option<&Seat> {
        self.seats[slot(color)].as_ref()
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<&Seat> {
        self.seats
            .iter()
            .flatten()
            .find(|seat| seat.player_id == player_id)
    }

    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().flatten()
    }

    pub fn broadcast(&self, msg: &ServerMsg) {
        for seat in self.seats() {
            seat.send(msg);
        }
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn active(&self) -> Option<Color> {
        self.active
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// No clock of the session has ever been started.
    pub fn clocks_idle(&self) -> bool {
        self.seats().all(|seat| !seat.clock.is_started())
    }

    pub(crate) fn take_seats(&mut self) -> Vec<Seat> {
        self.seats.iter_mut().filter_map(Option::take).collect()
    }
}

/// Read-only view served by the audit endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    pub moves: Vec<String>,
    pub ended: bool,
    #[serde(rename = "activeTurn")]
    pub active_turn: Option<Color>,
    pub players: Vec<SeatSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatSummary {
    pub color: Color,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    #[serde(rename = "remainingSeconds")]
    pub remaining_secs: u32,
}

pub struct Session {
    id: SessionId,
    is_ai: bool,
    created_at: Instant,
    state: Mutex<SessionState>,
}

impl Session {
    fn new(id: SessionId, is_ai: bool, seats: [Seat; 2]) -> Self {
        let mut slots: [Option<Seat>; 2] = [None, None];
        for seat in seats {
            let index = slot(seat.color);
            slots[index] = Some(seat);
        }
        Self {
            id,
            is_ai,
            created_at: Instant::now(),
            state: Mutex::new(SessionState {
                seats: slots,
                moves: Vec::new(),
                active: Some(Color::White),
                ended: false,
                ended_at: None,
                unclassifiable: false,
            }),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_ai(&self) -> bool {
        self.is_ai
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock()
    }

    pub fn is_ended(&self) -> bool {
        self.state.lock().ended
    }

    pub fn moves(&self) -> Vec<String> {
        self.state.lock().moves.clone()
    }

    pub fn active_turn(&self) -> Option<Color> {
        self.state.lock().active
    }

    pub fn color_of(&self, player_id: PlayerId) -> Option<Color> {
        self.state.lock().seat_of(player_id).map(|seat| seat.color)
    }

    pub fn player_at(&self, color: Color) -> Option<PlayerId> {
        self.state.lock().seat(color).map(|seat| seat.player_id)
    }

    pub fn clock_snapshot(&self, color: Color) -> Option<ClockSnapshot> {
        self.state.lock().seat(color).map(|seat| seat.clock.snapshot())
    }

    /// Move history as the engine expects it, if `ai_id` still sits here and
    /// the game is live.
    pub fn history_for(&self, ai_id: PlayerId) -> Option<String> {
        let state = self.state.lock();
        if state.ended || state.seat_of(ai_id).is_none() {
            return None;
        }
        Some(state.moves.join(" "))
    }

    pub fn summary(&self) -> SessionSummary {
        let state = self.state.lock();
        SessionSummary {
            id: self.id,
            is_ai: self.is_ai,
            moves: state.moves.clone(),
            ended: state.ended,
            active_turn: state.active,
            players: state
                .seats()
                .map(|seat| SeatSummary {
                    color: seat.color,
                    is_ai: seat.is_ai(),
                    remaining_secs: seat.clock.remaining(),
                })
                .collect(),
        }
    }

    fn ended_before(&self, cutoff: Instant) -> bool {
        let state = self.state.lock();
        matches!(state.ended_at, Some(at) if at <= cutoff)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("is_ai", &self.is_ai)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<SessionId, Arc<Session>>,
    by_player: HashMap<PlayerId, SessionId>,
}

#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a session. `build` receives the fresh id so the
    /// seats' clock callbacks can refer to it.
    pub fn create<F>(&self, is_ai: bool, build: F) -> Arc<Session>
    where
        F: FnOnce(SessionId) -> [Seat; 2],
    {
        let mut inner = self.inner.write();
        let id = loop {
            let candidate = SessionId::random();
            if !inner.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Arc::new(Session::new(id, is_ai, build(id)));
        {
            let state = session.state.lock();
            for seat in state.seats() {
                inner.by_player.insert(seat.player_id, id);
            }
        }
        inner.sessions.insert(id, Arc::clone(&session));
        debug!(session_id = %id, is_ai, "session registered");
        session
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.inner.read().sessions.get(&id).cloned()
    }

    pub fn session_for(&self, player_id: PlayerId) -> Option<Arc<Session>> {
        let inner = self.inner.read();
        let id = inner.by_player.get(&player_id)?;
        inner.sessions.get(id).cloned()
    }

    pub fn contains_player(&self, player_id: PlayerId) -> bool {
        self.inner.read().by_player.contains_key(&player_id)
    }

    /// Unlink players from the room they were in. The session itself stays
    /// until pruned.
    pub fn release_players(&self, session_id: SessionId, players: &[PlayerId]) {
        let mut inner = self.inner.write();
        for player_id in players {
            if inner.by_player.get(player_id) == Some(&session_id) {
                inner.by_player.remove(player_id);
            }
        }
    }

    /// Drop sessions that ended at least `retention` ago. Returns how many
    /// were removed.
    pub fn prune_ended(&self, retention: Duration) -> usize {
        let Some(cutoff) = Instant::now().checked_sub(retention) else {
            return 0;
        };

        let candidates: Vec<Arc<Session>> = self.inner.read().sessions.values().cloned().collect();
        let expired: Vec<SessionId> = candidates
            .iter()
            .filter(|session| session.ended_before(cutoff))
            .map(|session| session.id())
            .collect();
        if expired.is_empty() {
            return 0;
        }

        let mut inner = self.inner.write();
        for id in &expired {
            inner.sessions.remove(id);
        }
        inner.by_player.retain(|_, session_id| !expired.contains(session_id));
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn live_count(&self) -> usize {
        let sessions: Vec<Arc<Session>> = self.inner.read().sessions.values().cloned().collect();
        sessions.iter().filter(|s| !s.is_ended()).count()
    }
}
