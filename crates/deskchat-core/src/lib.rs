//! Core of the deskchat messaging client.
//!
//! Everything here is a pure state machine: no sockets, no HTTP, no async
//! runtime. Components take events (and the current time where it matters)
//! and return actions for a driver to execute.
//!
//! # Components
//!
//! - [`MessageStore`]: Ordered, deduplicated message set backing the UI
//! - [`HistorySynchronizer`]: Cold load and resync reconciliation
//! - [`ConnectionManager`]: Socket lifecycle and fixed-delay reconnects
//! - [`MentionSuggester`]: `@username` autocomplete over the roster
//! - [`NotificationGate`]: Mute preference and audio cue decisions
//! - [`MessageMapper`]: Raw records to display-ready [`Message`]s

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod env;
pub mod error;
pub mod history;
pub mod mention;
pub mod message;
pub mod notify;
pub mod roster;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use connection::{
    ConnectionAction, ConnectionManager, ConnectionState, RECONNECT_DELAY, SocketId,
};
pub use env::Environment;
pub use error::{NotificationError, PreferenceError};
pub use history::{HistorySynchronizer, SyncMode};
pub use mention::{MAX_CANDIDATES, MentionQuery, MentionSuggester, Segment, highlight_mentions};
pub use message::{Message, MessageId};
pub use notify::{
    Cue, MUTE_KEY, MemoryPreferenceStore, NotificationGate, NotificationSink, PreferenceStore,
};
pub use roster::{MessageMapper, PassthroughUrls, Roster, RosterEntry, UrlNormalizer};
pub use store::{LiveInsert, MessageStore};
