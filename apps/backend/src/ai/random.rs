//! Engine that plays a uniformly random legal move.
//!
//! Useful where no UCI binary is installed and in tests. Seedable for
//! reproducible games; the skill level is accepted and ignored.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::prelude::*;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Position};

use super::trait_def::{EngineError, EngineFactory, MoveEngine};
use crate::domain::rules::replay;

pub struct RandomEngine {
    rng: Mutex<StdRng>,
}

impl RandomEngine {
    pub const NAME: &'static str = "random";

    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl MoveEngine for RandomEngine {
    async fn best_move(&self, history: &str, _depth: u8) -> Result<String, EngineError> {
        let pos = replay(history.split_whitespace())
            .map_err(|err| EngineError::InvalidPosition(err.to_string()))?;
        let legal = pos.legal_moves();
        let chosen = {
            let mut rng = self.rng.lock();
            legal.choose(&mut *rng).cloned()
        };
        let Some(chosen) = chosen else {
            return Err(EngineError::InvalidPosition(
                "no legal moves in position".to_string(),
            ));
        };
        Ok(UciMove::from_move(&chosen, CastlingMode::Standard).to_string())
    }
}

/// Factory for [`RandomEngine`]. A fixed seed is offset per spawn so two
/// engines from the same factory do not mirror each other.
#[derive(Debug, Default)]
pub struct RandomEngineFactory {
    seed: Option<u64>,
    spawned: Mutex<u64>,
}

impl RandomEngineFactory {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            spawned: Mutex::new(0),
        }
    }
}

#[async_trait]
impl EngineFactory for RandomEngineFactory {
    fn name(&self) -> &str {
        RandomEngine::NAME
    }

    async fn spawn(&self, _level: u8) -> Result<Arc<dyn MoveEngine>, EngineError> {
        let seed = self.seed.map(|seed| {
            let mut spawned = self.spawned.lock();
            *spawned += 1;
            seed.wrapping_add(*spawned)
        });
        Ok(Arc::new(RandomEngine::new(seed)))
    }
}
