use thiserror::Error;

use super::protocol::ServerMsg;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("connection closed")]
    Closed,
}

/// Outbound half of one player's connection.
///
/// Sends are best effort: callers log a failure and carry on, a broken
/// connection never aborts game logic.
pub trait Transport: Send + Sync {
    fn send(&self, msg: &ServerMsg) -> Result<(), TransportError>;

    /// Close the connection. Must tolerate being called more than once.
    fn close(&self);
}
