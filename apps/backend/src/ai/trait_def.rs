//! Move engine seam.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::AppError;

/// Errors raised by a move engine or while bringing one up.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine process could not be launched.
    #[error("failed to spawn engine `{path}`: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Engine answered with something we could not interpret.
    #[error("engine protocol error: {0}")]
    Protocol(String),
    #[error("engine closed its output")]
    Closed,
    /// Move history the engine was asked about does not describe a legal game.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    #[error("unknown engine `{0}`")]
    Unknown(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::internal(format!("engine error: {err}"))
    }
}

/// A running engine bound to one strength level.
///
/// `history` is the space-separated list of UCI moves played from the
/// standard start position; it may be empty.
#[async_trait]
pub trait MoveEngine: Send + Sync {
    async fn best_move(&self, history: &str, depth: u8) -> Result<String, EngineError>;
}

/// Builds engines at a requested skill level.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    fn name(&self) -> &str;

    async fn spawn(&self, level: u8) -> Result<Arc<dyn MoveEngine>, EngineError>;
}
