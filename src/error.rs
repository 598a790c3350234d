// src/error.rs

//! Typed failures of the core.
//!
//! Neither of these ever escapes an observer entry point: lookup failures
//! degrade a field to `null`, sink failures are logged and dropped.

use thiserror::Error;

/// Failure reading secondary descriptive data (URLs, parent job) from a run.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{0} is not available")]
    Missing(&'static str),

    #[error("failed to read {field}: {message}")]
    Failed {
        field: &'static str,
        message: String,
    },
}

/// Failure handing a normalized event to an emitter.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink is closed")]
    Closed,

    #[error("sink queue is full, event dropped")]
    QueueFull,

    #[error("failed to serialise event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink rejected event: {0}")]
    Rejected(String),
}
