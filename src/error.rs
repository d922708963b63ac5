// src/error.rs
//! Unified error type for AECG100 client operations
//!
//! Validation errors are raised synchronously at the call site. Connection
//! and handshake failures free the native handle before the error is
//! returned, so there is no dangling connected-but-unusable state.
//! Asynchronous sampling errors are not represented here; they arrive
//! out-of-band as [`crate::sampling::SamplingEvent::Error`].

use thiserror::Error;

/// Result type alias for AECG100 client operations.
pub type AecgResult<T> = Result<T, AecgError>;

/// Errors raised by the AECG100 client.
#[derive(Debug, Error)]
pub enum AecgError {
    /// The vendor shared object could not be loaded or is missing a required
    /// entry point. Fatal; there is no retry.
    #[error("failed to load vendor library {path}: {reason}")]
    Load {
        /// Path the load was attempted from.
        path: String,
        /// Loader or symbol-resolution failure detail.
        reason: String,
    },

    /// The device rejected the connection handshake. The caller may retry.
    #[error("failed to connect to the device")]
    ConnectionFailed,

    /// The device did not signal within the handshake bound. The caller may
    /// retry with a longer timeout or a different port.
    #[error("device did not respond within {timeout_ms} ms")]
    Timeout {
        /// The bound that elapsed.
        timeout_ms: u64,
    },

    /// An operation was attempted outside the `Connected` state.
    #[error("device is not connected")]
    NotConnected,

    /// Parameter validation failed before any native call was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The loaded vendor binary does not export the required entry point.
    #[error("operation not supported by the loaded vendor library: {0}")]
    Unsupported(&'static str),

    /// Client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Filesystem error while reading sample data or configuration.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
