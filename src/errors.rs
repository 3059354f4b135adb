//! Structured error types for jank
//!
//! Using thiserror for automatic Display implementation and error chaining.
//!
//! Nothing in this crate is fatal to the host: every error here is produced
//! by a setup path, logged, and degraded to "no metric" or "no stack sample"
//! rather than aborting tracking.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("failed to connect the frame clock: {0}")]
    ClockConnectFailed(String),

    #[error("failed to read module maps: {0}")]
    ModuleMapsUnavailable(String),

    #[error("failed to spawn {thread} thread: {error}")]
    ThreadSpawnFailed { thread: String, error: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
