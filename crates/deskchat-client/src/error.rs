//! Error types for the I/O layer.
//!
//! Each boundary has its own enum. Only [`RuntimeError`] ends the runtime
//! loop; everything else is logged and folded into widget state.

use std::io;

use deskchat_proto::{GENERIC_ERROR_MESSAGE, ProtocolError};
use thiserror::Error;

/// HTTP API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never produced a response (DNS, connect, timeout).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server refused the request and explained why.
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Response envelope did not report success.
    #[error("unexpected response status: {0}")]
    UnexpectedStatus(String),

    /// Response body did not decode.
    #[error("decode error: {0}")]
    Decode(#[from] ProtocolError),

    /// Endpoint URL could not be built.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Message suitable for a user-visible alert.
    ///
    /// Only a rejection carries server text; everything else maps to the
    /// generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Http(_) | Self::UnexpectedStatus(_) | Self::Decode(_) | Self::Url(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            },
        }
    }
}

/// Socket transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream failed after opening.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Base URL scheme has no WebSocket counterpart.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// URL could not be parsed or joined.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Roster file could not be read.
    #[error("failed to read roster: {0}")]
    Io(#[from] io::Error),

    /// Roster file is not valid JSON.
    #[error("invalid roster: {0}")]
    Roster(#[from] serde_json::Error),
}

/// Errors that stop the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// View failed to render or alert.
    #[error("view error: {0}")]
    View(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// HTTP client could not be built.
    #[error("api setup failed: {0}")]
    Api(#[from] ApiError),

    /// Configuration is unusable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
