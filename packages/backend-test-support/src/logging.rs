//! Logging for integration test binaries.
//!
//! Each binary under `tests/` installs this once through `ctor`. The filter
//! is read from `TEST_LOG`, then `RUST_LOG`, and defaults to `warn` so
//! clock ticks and matchmaking polls stay quiet unless asked for.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "warn";

/// Install the test subscriber. Idempotent; a subscriber installed by
/// someone else wins silently.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .with_target(true)
            .try_init()
            .ok();
    });
}
