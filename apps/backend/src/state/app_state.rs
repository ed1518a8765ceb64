use std::sync::Arc;

use crate::services::Arena;

/// Application state shared with every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    arena: Arc<Arena>,
}

impl AppState {
    pub fn new(arena: Arc<Arena>) -> Self {
        Self { arena }
    }

    pub fn arena(&self) -> Arc<Arena> {
        Arc::clone(&self.arena)
    }
}
