//! Error types shared between client and server.
//!
//! The `QuoteError` enum tags every failure that can cross a process or network
//! boundary, so callers branch on the variant instead of inspecting the
//! underlying library error.
use std::io;
use std::time::Duration;

use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Bounded operation a time budget applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    /// Client -> server round trip.
    ClientCall,
    /// Whole inbound request handled by the server.
    Inbound,
    /// Server -> external quote API round trip.
    Fetch,
    /// Server -> storage write.
    Persist,
}

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// A required currency code was absent or empty.
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),

    /// The budget for `stage` elapsed before the operation completed.
    #[error("deadline exceeded: {} budget of {} ms elapsed", .stage, .budget.as_millis())]
    DeadlineExceeded {
        /// Operation whose budget elapsed.
        stage: Stage,
        /// Configured budget.
        budget: Duration,
    },

    /// DNS, connect, TLS or body-read failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote side answered with a non-success HTTP status.
    #[error("remote endpoint returned status {status}")]
    UpstreamStatus {
        /// HTTP status code.
        status: u16,
    },

    /// The payload could not be decoded into the expected JSON shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The store could not be opened.
    #[error("storage connection error: {0}")]
    Connection(String),

    /// The storage schema could not be ensured.
    #[error("storage schema error: {0}")]
    Schema(String),

    /// A row could not be written.
    #[error("storage write error: {0}")]
    Write(String),

    /// Generic formatting/validation error with a human-readable message.
    #[error("format error: {0}")]
    Format(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error originating from the standard library or tokio.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl QuoteError {
    /// Build a `DeadlineExceeded` for `stage`.
    pub fn deadline(stage: Stage, budget: Duration) -> Self {
        QuoteError::DeadlineExceeded { stage, budget }
    }

    /// `true` when the failure is an elapsed budget rather than a fault.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, QuoteError::DeadlineExceeded { .. })
    }
}
