//! Pausable per-player countdown.
//!
//! A clock moves through `Idle → Running ⇄ Paused → Over`. Once started it
//! owns one background task that decrements `remaining` once per second and
//! reports every new value to the tick callback, ending with exactly one
//! call carrying `0`. Pausing parks the task on a [`Notify`] instead of
//! polling and banks the unspent part of the current second, so a run of
//! short turns is charged in full. A single [`CancellationToken`] is
//! checked at every suspension point so [`TurnClock::stop`] silences the
//! clock for good.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Length of one decrement.
pub const TICK: Duration = Duration::from_secs(1);

pub type TickCallback = Box<dyn Fn(u32) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPhase {
    Idle,
    Running,
    Paused,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSnapshot {
    pub remaining: u32,
    pub started: bool,
    pub running: bool,
    pub paused: bool,
    pub over: bool,
}

impl ClockSnapshot {
    pub fn phase(&self) -> ClockPhase {
        if self.over {
            ClockPhase::Over
        } else if !self.started {
            ClockPhase::Idle
        } else if self.paused {
            ClockPhase::Paused
        } else {
            ClockPhase::Running
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("clock already started")]
    AlreadyStarted,
    #[error("clock is over")]
    Over,
}

struct ClockState {
    remaining: u32,
    started: bool,
    running: bool,
    paused: bool,
    over: bool,
    /// When the current second is used up. Only meaningful while running.
    deadline: Instant,
    /// Unspent part of the current second, banked by `pause`.
    leftover: Duration,
}

struct ClockInner {
    state: Mutex<ClockState>,
    changed: Notify,
    cancel: CancellationToken,
    on_tick: TickCallback,
}

pub struct TurnClock {
    inner: Arc<ClockInner>,
}

impl TurnClock {
    pub fn new<F>(seconds: u32, on_tick: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ClockInner {
                state: Mutex::new(ClockState {
                    remaining: seconds,
                    started: false,
                    running: false,
                    paused: false,
                    over: false,
                    deadline: Instant::now(),
                    leftover: TICK,
                }),
                changed: Notify::new(),
                cancel: CancellationToken::new(),
                on_tick: Box::new(on_tick),
            }),
        }
    }

    /// Start counting down. Only valid from `Idle`; must be called inside a
    /// tokio runtime.
    pub fn start(&self) -> Result<(), ClockError> {
        {
            let mut state = self.inner.state.lock();
            if state.over {
                return Err(ClockError::Over);
            }
            if state.started {
                return Err(ClockError::AlreadyStarted);
            }
            state.started = true;
            state.running = true;
            state.paused = false;
            state.deadline = Instant::now() + TICK;
            state.leftover = TICK;
        }

        tokio::spawn(run(Arc::clone(&self.inner)));
        Ok(())
    }

    pub fn pause(&self) -> Result<(), ClockError> {
        {
            let mut state = self.inner.state.lock();
            if state.over {
                return Err(ClockError::Over);
            }
            if state.paused {
                return Ok(());
            }
            if state.started {
                // A second already due but not yet charged is owed in full
                // and charged on resume.
                state.leftover = state.deadline.saturating_duration_since(Instant::now());
            }
            state.paused = true;
            state.running = false;
        }
        self.inner.changed.notify_waiters();
        Ok(())
    }

    pub fn resume(&self) -> Result<(), ClockError> {
        {
            let mut state = self.inner.state.lock();
            if state.over {
                return Err(ClockError::Over);
            }
            if !state.paused {
                return Ok(());
            }
            state.paused = false;
            state.running = state.started;
            if state.started {
                state.deadline = Instant::now() + state.leftover;
            }
        }
        self.inner.changed.notify_waiters();
        Ok(())
    }

    /// Force the clock over. Idempotent; no tick fires after this returns
    /// unless one was already past its final cancellation check.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.lock();
            state.over = true;
            state.running = false;
        }
        self.inner.cancel.cancel();
        self.inner.changed.notify_waiters();
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        let state = self.inner.state.lock();
        ClockSnapshot {
            remaining: state.remaining,
            started: state.started,
            running: state.running,
            paused: state.paused,
            over: state.over,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.inner.state.lock().remaining
    }

    pub fn is_started(&self) -> bool {
        self.inner.state.lock().started
    }
}

impl Drop for TurnClock {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

impl std::fmt::Debug for TurnClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnClock")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

async fn run(inner: Arc<ClockInner>) {
    loop {
        // Register interest before reading state so a pause or resume that
        // lands in between is not lost.
        let changed = inner.changed.notified();
        tokio::pin!(changed);
        changed.as_mut().enable();

        let (paused, deadline) = {
            let state = inner.state.lock();
            if state.over {
                return;
            }
            (state.paused, state.deadline)
        };

        if paused {
            tokio::select! {
                _ = inner.cancel.cancelled() => return,
                _ = &mut changed => continue,
            }
        }

        tokio::select! {
            _ = inner.cancel.cancelled() => return,
            _ = &mut changed => continue,
            _ = sleep_until(deadline) => {}
        }

        let remaining = {
            let mut state = inner.state.lock();
            if state.over {
                return;
            }
            if state.paused || Instant::now() < state.deadline {
                continue;
            }
            state.deadline += TICK;
            state.remaining = state.remaining.saturating_sub(1);
            if state.remaining == 0 {
                state.over = true;
                state.running = false;
            }
            state.remaining
        };

        if inner.cancel.is_cancelled() {
            return;
        }

        trace!(remaining, "clock tick");
        (inner.on_tick)(remaining);

        if remaining == 0 {
            debug!("clock expired");
            inner.cancel.cancel();
            return;
        }
    }
}
