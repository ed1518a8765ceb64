//! Matchmaking and game settings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

use super::env::{parse_or, Lookup, ProcessEnv};
use crate::ai::AiConfig;
use crate::error::AppError;

/// Half-open window `[min, max)` a random delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRange {
    pub min: Duration,
    pub max: Duration,
}

impl DurationRange {
    pub fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }

    pub const fn fixed(value: Duration) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Uniform draw at millisecond resolution. A degenerate window
    /// always yields `min`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max <= min {
            return self.min;
        }
        Duration::from_millis(rng.random_range(min..max))
    }

    fn validate(&self, name: &str) -> Result<(), AppError> {
        if self.max < self.min {
            return Err(AppError::config(format!(
                "{name}: max ({:?}) is below min ({:?})",
                self.max, self.min
            )));
        }
        Ok(())
    }
}

/// When the per-player clocks begin counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockStart {
    /// Idle until the first turn flip, then the usual pause/resume protocol.
    #[default]
    FirstFlip,
    /// White's clock starts as soon as the pair is made.
    OnMatch,
    /// Idle until a move flagged `isFirstMove` arrives.
    ClientSignalled,
}

impl ClockStart {
    pub const fn as_str(self) -> &'static str {
        match self {
            ClockStart::FirstFlip => "first_flip",
            ClockStart::OnMatch => "on_match",
            ClockStart::ClientSignalled => "client_signalled",
        }
    }
}

impl fmt::Display for ClockStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first_flip" => Ok(ClockStart::FirstFlip),
            "on_match" => Ok(ClockStart::OnMatch),
            "client_signalled" => Ok(ClockStart::ClientSignalled),
            other => Err(format!(
                "unknown clock start policy `{other}` (expected first_flip, on_match or client_signalled)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchmakingConfig {
    /// Chance a new player is sent straight to an AI opponent.
    pub ai_probability: f64,
    pub ai_wait: DurationRange,
    /// How long the human search runs before falling back to an AI.
    pub opponent_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            ai_probability: 0.5,
            ai_wait: DurationRange::from_secs(4, 10),
            opponent_timeout: Duration::from_secs(7),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub duration_secs: u32,
    pub clock_start: ClockStart,
    /// How long an ended session stays queryable before the janitor drops it.
    pub retention: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            clock_start: ClockStart::FirstFlip,
            retention: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArenaConfig {
    pub matchmaking: MatchmakingConfig,
    pub game: GameConfig,
    pub ai: AiConfig,
}

impl ArenaConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(&ProcessEnv)
    }

    pub fn from_lookup<L: Lookup + ?Sized>(env: &L) -> Result<Self, AppError> {
        let defaults = Self::default();

        let matchmaking = MatchmakingConfig {
            ai_probability: parse_or(
                env,
                "MATCH_AI_PROBABILITY",
                defaults.matchmaking.ai_probability,
            )?,
            ai_wait: DurationRange::from_secs(
                parse_or(env, "MATCH_AI_WAIT_MIN_SECS", 4u64)?,
                parse_or(env, "MATCH_AI_WAIT_MAX_SECS", 10u64)?,
            ),
            opponent_timeout: Duration::from_secs(parse_or(
                env,
                "MATCH_OPPONENT_TIMEOUT_SECS",
                7u64,
            )?),
            poll_interval: Duration::from_millis(parse_or(env, "MATCH_POLL_INTERVAL_MS", 1000u64)?),
        };

        let game = GameConfig {
            duration_secs: parse_or(env, "GAME_DURATION_SECS", defaults.game.duration_secs)?,
            clock_start: parse_or(env, "GAME_CLOCK_START", defaults.game.clock_start)?,
            retention: Duration::from_secs(parse_or(env, "SESSION_RETENTION_SECS", 3600u64)?),
        };

        let config = Self {
            matchmaking,
            game,
            ai: AiConfig::from_lookup(env)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let p = self.matchmaking.ai_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(AppError::config(format!(
                "MATCH_AI_PROBABILITY must be within [0, 1], got {p}"
            )));
        }
        self.matchmaking.ai_wait.validate("MATCH_AI_WAIT")?;
        if self.matchmaking.poll_interval.is_zero() {
            return Err(AppError::config(
                "MATCH_POLL_INTERVAL_MS must be positive".to_string(),
            ));
        }
        if self.game.duration_secs == 0 {
            return Err(AppError::config(
                "GAME_DURATION_SECS must be positive".to_string(),
            ));
        }
        self.ai.validate()
    }
}
