//! Computer opponent settings.

use std::ops::Range;

use crate::config::env::{parse_or, string_or, Lookup};
use crate::config::DurationRange;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    /// Upper bound of the per-move search depth; the opening move uses it
    /// directly.
    pub max_depth: u8,
    /// Simulated thinking time before each reply.
    pub think: DurationRange,
    /// Target ratings are drawn from here and snapped to the skill table.
    pub rating: Range<u32>,
    /// Registry name of the engine factory.
    pub engine: String,
    /// Binary launched by the UCI factory.
    pub engine_path: String,
    /// Seed for the random engine; unset means OS entropy.
    pub seed: Option<u64>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            think: DurationRange::from_secs(1, 6),
            rating: 100..2100,
            engine: "stockfish".to_string(),
            engine_path: "stockfish".to_string(),
            seed: None,
        }
    }
}

impl AiConfig {
    pub fn from_lookup<L: Lookup + ?Sized>(env: &L) -> Result<Self, AppError> {
        let seed: Option<u64> = match env.get("AI_SEED") {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| AppError::config(format!("AI_SEED={raw:?} is invalid: {e}")))?,
            ),
            _ => None,
        };

        Ok(Self {
            max_depth: parse_or(env, "AI_MAX_DEPTH", 10u8)?,
            think: DurationRange::from_secs(
                parse_or(env, "AI_THINK_MIN_SECS", 1u64)?,
                parse_or(env, "AI_THINK_MAX_SECS", 6u64)?,
            ),
            rating: parse_or(env, "AI_RATING_MIN", 100u32)?..parse_or(env, "AI_RATING_MAX", 2100u32)?,
            engine: string_or(env, "AI_ENGINE", "stockfish"),
            engine_path: string_or(env, "AI_ENGINE_PATH", "stockfish"),
            seed,
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_depth == 0 {
            return Err(AppError::config("AI_MAX_DEPTH must be at least 1".to_string()));
        }
        if self.think.max < self.think.min {
            return Err(AppError::config(
                "AI_THINK_MAX_SECS is below AI_THINK_MIN_SECS".to_string(),
            ));
        }
        if self.rating.end < self.rating.start {
            return Err(AppError::config(
                "AI_RATING_MAX is below AI_RATING_MIN".to_string(),
            ));
        }
        Ok(())
    }
}
