//! Protocol decode errors.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding wire data.
///
/// None of these are fatal to the client. Callers log them and discard the
/// offending frame or body.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Input was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON was valid but did not carry an `action` the client understands.
    #[error("unrecognized frame action: {0}")]
    UnknownAction(String),

    /// JSON was valid but the frame had no `action` field.
    #[error("frame has no action field")]
    MissingAction,

    /// Response envelope reported something other than success.
    #[error("unexpected response status: {0}")]
    UnexpectedStatus(String),
}
