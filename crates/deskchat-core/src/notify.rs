//! Audio cue gating and the persisted mute preference.
//!
//! The cue itself and durable storage are host capabilities injected as
//! [`NotificationSink`] and [`PreferenceStore`]. The gate owns the mute flag:
//! it is hydrated once at construction and only changes through
//! [`NotificationGate::toggle_mute`].

use std::collections::HashMap;

use crate::{NotificationError, PreferenceError};

/// Preference key holding the mute flag (`"true"` / `"false"`).
pub const MUTE_KEY: &str = "chat_muted";

/// Plays the arrival cue.
pub trait NotificationSink: Send {
    /// Play the cue once.
    ///
    /// # Errors
    ///
    /// Any failure to play. Callers swallow it.
    fn play(&self) -> Result<(), NotificationError>;
}

/// Durable string key-value storage.
pub trait PreferenceStore: Send {
    /// Read `key`. `Ok(None)` if never set.
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    /// Write `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Non-durable [`PreferenceStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl MemoryPreferenceStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// What the gate did with an arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Cue played.
    Played,
    /// Sender is the current user.
    OwnMessage,
    /// Muted by preference.
    Muted,
    /// No sink configured.
    Unavailable,
    /// Sink refused to play; error was swallowed.
    Failed,
}

/// Decides whether an arriving message plays the audio cue.
pub struct NotificationGate {
    current_user: String,
    muted: bool,
    sink: Option<Box<dyn NotificationSink>>,
    prefs: Box<dyn PreferenceStore>,
}

impl std::fmt::Debug for NotificationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationGate")
            .field("current_user", &self.current_user)
            .field("muted", &self.muted)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl NotificationGate {
    /// Create a gate, hydrating the mute flag from `prefs`.
    ///
    /// An unreadable or unrecognized preference counts as unmuted.
    pub fn new(
        current_user: impl Into<String>,
        sink: Option<Box<dyn NotificationSink>>,
        prefs: Box<dyn PreferenceStore>,
    ) -> Self {
        let muted = match prefs.get(MUTE_KEY) {
            Ok(Some(value)) => value == "true",
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Failed to read mute preference: {:?}", e);
                false
            },
        };

        Self { current_user: current_user.into(), muted, sink, prefs }
    }

    /// Current mute flag.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Flip the mute flag and persist it. Returns the new value.
    ///
    /// A persist failure is logged; the in-memory flag still changes.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        let value = if self.muted { "true" } else { "false" };
        if let Err(e) = self.prefs.set(MUTE_KEY, value) {
            tracing::warn!("Failed to persist mute preference: {:?}", e);
        }
        self.muted
    }

    /// Handle a newly arrived message from `sender`.
    pub fn on_arrival(&self, sender: &str) -> Cue {
        if sender == self.current_user {
            return Cue::OwnMessage;
        }
        if self.muted {
            tracing::debug!(sender, "cue suppressed: muted");
            return Cue::Muted;
        }
        let Some(sink) = &self.sink else {
            return Cue::Unavailable;
        };

        match sink.play() {
            Ok(()) => Cue::Played,
            Err(e) => {
                tracing::debug!("cue playback failed: {}", e);
                Cue::Failed
            },
        }
    }
}
