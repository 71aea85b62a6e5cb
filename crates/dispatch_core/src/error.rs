//! Error types for the dispatch engine.
//!
//! "No driver available" and "dispatch cancelled" are ordinary outcomes reported through
//! [`crate::dispatch::MatchResult`]; only genuine faults appear here.

use thiserror::Error;

/// Errors surfaced by the dispatch engine.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed request input (out-of-range or non-finite coordinates).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A driver id appeared twice in the pool.
    #[error("pool corruption: duplicate driver id {driver_id}")]
    PoolCorruption { driver_id: u32 },

    /// The assignment sink failed after a driver was chosen.
    #[error("assignment sink failed: {0}")]
    Sink(#[from] SinkError),

    /// Configuration could not be loaded or is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors returned by an [`crate::sink::AssignmentSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// The backing store rejected the write.
    #[error("store rejected assignment of driver {driver_id} to ride {ride_id}: {message}")]
    Rejected {
        ride_id: u64,
        driver_id: u32,
        message: String,
    },

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
