//! Error types for the collaborator traits injected into the core.
//!
//! Neither error is ever fatal. The notification gate logs them and carries
//! on with its in-memory state.

use thiserror::Error;

/// Errors from a [`crate::PreferenceStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    /// Backing storage could not be read or written
    #[error("preference storage unavailable: {0}")]
    Unavailable(String),

    /// Stored data exists but could not be decoded
    #[error("preference data is corrupt: {0}")]
    Corrupt(String),
}

/// Errors from a [`crate::NotificationSink`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// Cue resource is missing or failed to load
    #[error("notification cue unavailable")]
    Unavailable,

    /// Playback was refused by the host (e.g. autoplay policy, no output)
    #[error("notification playback blocked: {0}")]
    Blocked(String),
}
