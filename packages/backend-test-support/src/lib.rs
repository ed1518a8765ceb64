//! Helpers shared by the backend's integration test binaries: logging
//! bootstrap and problem-details assertions.

pub mod logging;
pub mod problem_details;
