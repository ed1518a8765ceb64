#![allow(dead_code)]

// Logging is auto-installed for every test binary that includes `common`.
#[ctor::ctor]
fn init_logging() {
    blitz_test_support::logging::init();
}
