//! Custom error types for the acquisition pipeline.
//!
//! This module defines the primary error type, `DaqError`, for the whole crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way to
//! handle the different kinds of failures the pipeline can hit, from malformed
//! record construction to channel-level transfer problems.
//!
//! ## Error Taxonomy
//!
//! - **`InvalidShape`**: a record was constructed from slices of the wrong
//!   length. Fatal for that record; it is rejected before it can enter the
//!   accumulation buffer.
//! - **`DeviceRead`**: a hardware read failed for one tick. Transient; the
//!   producer's configured [`ReadErrorPolicy`](crate::config::ReadErrorPolicy)
//!   decides whether to skip the tick or abort the run. Never corrupts the
//!   buffer.
//! - **`ChannelClosed`**: the producer went away before marking the transfer
//!   finished, so a final drain could not be guaranteed. Always surfaced to
//!   the consumer, never treated as an empty drain.
//! - **`TransferTimeout`**: the consumer waited past the configured bound for
//!   data with no producer activity. Surfaced, not retried automatically.
//! - **`MalformedChunk`**: a chunk arrived whose payload does not decode to a
//!   whole number of records. The chunk is never partially delivered.
//! - **`Config`** / **`Configuration`**: file-level and semantic configuration
//!   failures, the latter raised by `Settings::validate`.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, DaqError>;

/// Errors produced by the acquisition pipeline.
#[derive(Error, Debug)]
pub enum DaqError {
    /// A record was built from channel data of the wrong length.
    #[error("invalid record shape: expected {expected} {what} values, got {actual}")]
    InvalidShape {
        /// Which channel group had the wrong length ("force" or "trigger").
        what: &'static str,
        /// Required number of values.
        expected: usize,
        /// Number of values actually supplied.
        actual: usize,
    },

    /// A per-tick hardware read failed.
    #[error("device read failed: {0}")]
    DeviceRead(String),

    /// The producer terminated without completing its final flush handshake.
    #[error("transfer channel closed before the final drain completed")]
    ChannelClosed,

    /// The consumer waited past the configured bound with no producer activity.
    #[error("timed out after {0:?} waiting for data from the producer")]
    TransferTimeout(Duration),

    /// A transferred chunk did not decode to a whole number of records.
    #[error("malformed chunk: {0}")]
    MalformedChunk(String),

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration parsed but failed semantic validation.
    #[error("configuration validation error: {0}")]
    Configuration(String),

    /// I/O failure outside the transfer channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The producer task panicked or was cancelled before returning.
    #[error("producer task failed: {0}")]
    Producer(String),
}
