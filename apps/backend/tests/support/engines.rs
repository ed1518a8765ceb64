// Engine factories for driving AI sessions in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blitz_backend::ai::{EngineError, EngineFactory, MoveEngine, RandomEngine};
use parking_lot::Mutex;

/// Plays seeded random legal moves and records every request.
pub struct ScriptedEngine {
    inner: RandomEngine,
    calls: Mutex<Vec<(String, u8)>>,
}

impl ScriptedEngine {
    pub fn calls(&self) -> Vec<(String, u8)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MoveEngine for ScriptedEngine {
    async fn best_move(&self, history: &str, depth: u8) -> Result<String, EngineError> {
        self.calls.lock().push((history.to_string(), depth));
        self.inner.best_move(history, depth).await
    }
}

/// Hands out one shared [`ScriptedEngine`] and remembers requested levels.
pub struct ScriptedFactory {
    engine: Arc<ScriptedEngine>,
    levels: Mutex<Vec<u8>>,
}

impl ScriptedFactory {
    pub fn new(seed: u64) -> Arc<Self> {
        Arc::new(Self {
            engine: Arc::new(ScriptedEngine {
                inner: RandomEngine::new(Some(seed)),
                calls: Mutex::new(Vec::new()),
            }),
            levels: Mutex::new(Vec::new()),
        })
    }

    pub fn engine(&self) -> Arc<ScriptedEngine> {
        Arc::clone(&self.engine)
    }

    pub fn levels(&self) -> Vec<u8> {
        self.levels.lock().clone()
    }
}

#[async_trait]
impl EngineFactory for ScriptedFactory {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn spawn(&self, level: u8) -> Result<Arc<dyn MoveEngine>, EngineError> {
        self.levels.lock().push(level);
        Ok(self.engine.clone())
    }
}

/// Cannot start any engine.
pub struct FailingFactory;

#[async_trait]
impl EngineFactory for FailingFactory {
    fn name(&self) -> &str {
        "broken"
    }

    async fn spawn(&self, _level: u8) -> Result<Arc<dyn MoveEngine>, EngineError> {
        Err(EngineError::Closed)
    }
}

struct FailingMoveEngine;

#[async_trait]
impl MoveEngine for FailingMoveEngine {
    async fn best_move(&self, _history: &str, _depth: u8) -> Result<String, EngineError> {
        Err(EngineError::Protocol("engine crashed".to_string()))
    }
}

/// Starts engines that fail every move request.
pub struct FailingMoveFactory;

#[async_trait]
impl EngineFactory for FailingMoveFactory {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn spawn(&self, _level: u8) -> Result<Arc<dyn MoveEngine>, EngineError> {
        Ok(Arc::new(FailingMoveEngine))
    }
}

/// Wraps a [`ScriptedFactory`] and takes `delay` to start each engine.
pub struct SlowFactory {
    inner: Arc<ScriptedFactory>,
    delay: Duration,
}

impl SlowFactory {
    pub fn new(inner: Arc<ScriptedFactory>, delay: Duration) -> Arc<Self> {
        Arc::new(Self { inner, delay })
    }
}

#[async_trait]
impl EngineFactory for SlowFactory {
    fn name(&self) -> &str {
        "slow"
    }

    async fn spawn(&self, level: u8) -> Result<Arc<dyn MoveEngine>, EngineError> {
        tokio::time::sleep(self.delay).await;
        self.inner.spawn(level).await
    }
}
