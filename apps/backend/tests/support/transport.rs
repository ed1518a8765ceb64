// Transport that records every outbound message as JSON.

use std::sync::atomic::{AtomicBool, Ordering};

use blitz_backend::ws::{ServerMsg, Transport, TransportError};
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Value>>,
    closed: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Value> {
        self.sent.lock().clone()
    }

    pub fn states(&self) -> Vec<u64> {
        self.sent
            .lock()
            .iter()
            .filter_map(|m| m["state"].as_u64())
            .collect()
    }

    /// Messages with the given state code, in arrival order.
    pub fn with_state(&self, state: u64) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m["state"] == state)
            .cloned()
            .collect()
    }

    pub fn count(&self, state: u64) -> usize {
        self.with_state(state).len()
    }

    /// Everything except clock ticks.
    pub fn game_states(&self) -> Vec<u64> {
        self.states().into_iter().filter(|s| *s != 80).collect()
    }

    pub fn matched_color(&self) -> Option<String> {
        self.with_state(1)
            .first()
            .and_then(|m| m["data"]["color"].as_str().map(str::to_string))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn send(&self, msg: &ServerMsg) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let value = serde_json::to_value(msg)?;
        self.sent.lock().push(value);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
