//! Error types for room backends.

use livedoc_core::RoomId;
use thiserror::Error;

/// Result type alias for backend operations.
pub type RoomsResult<T> = Result<T, RoomsError>;

/// Errors that can occur while talking to a room backend.
#[derive(Debug, Error)]
pub enum RoomsError {
    /// Transport-level failure (connect, timeout, TLS, body decode).
    #[error("request to collaboration service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("collaboration service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Room does not exist.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
