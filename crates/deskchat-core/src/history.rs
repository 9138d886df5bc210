//! History reconciliation.
//!
//! Two kinds of fetch feed the store. The cold load runs once per widget
//! lifetime and replaces everything. A resync runs after every socket open
//! and merges by identity, so messages that only arrived live are kept.
//!
//! The synchronizer does no I/O. Callers ask whether a fetch may start,
//! perform it, and hand back the result.

use std::fmt;

use crate::{Message, MessageStore};

/// Kind of history fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncMode {
    /// One-time initial load; replaces the store.
    Cold,
    /// Post-reconnect gap fill; merges into the store.
    Resync,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cold => f.write_str("cold"),
            Self::Resync => f.write_str("resync"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColdLoad {
    NotStarted,
    InFlight,
    Done,
}

/// Reconciles fetched snapshots into a [`MessageStore`].
///
/// # Invariants
///
/// - At most one cold fetch is ever started.
/// - [`HistorySynchronizer::cold_loaded`] becomes true exactly once, after
///   the cold fetch settles (successfully or not).
#[derive(Debug, Clone)]
pub struct HistorySynchronizer {
    cold: ColdLoad,
}

impl Default for HistorySynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistorySynchronizer {
    /// Create a synchronizer that has not loaded anything.
    pub fn new() -> Self {
        Self { cold: ColdLoad::NotStarted }
    }

    /// Claim the cold load.
    ///
    /// Returns `true` the first time only; every later call (including
    /// concurrent ones while the fetch is in flight) returns `false`.
    pub fn begin_cold(&mut self) -> bool {
        if self.cold != ColdLoad::NotStarted {
            tracing::debug!(state = ?self.cold, "cold load already claimed");
            return false;
        }
        self.cold = ColdLoad::InFlight;
        true
    }

    /// True once the cold fetch has settled.
    pub fn cold_loaded(&self) -> bool {
        self.cold == ColdLoad::Done
    }

    /// Apply a successful fetch to `store`.
    ///
    /// A cold result replaces the store. A resync result is merged by
    /// identity. A cold result that arrives after the cold load already
    /// settled is merged instead of replacing.
    pub fn apply(&mut self, mode: SyncMode, messages: Vec<Message>, store: &mut MessageStore) {
        let count = messages.len();
        match mode {
            SyncMode::Cold if self.cold == ColdLoad::InFlight => {
                store.replace_all(messages);
                self.cold = ColdLoad::Done;
                tracing::info!(%mode, count, "history loaded");
            },
            SyncMode::Cold | SyncMode::Resync => {
                let added = store.merge(messages);
                tracing::info!(%mode, count, added, "history merged");
            },
        }
    }

    /// Record a failed fetch. The store is left untouched.
    ///
    /// A failed cold fetch still settles the cold load so the socket can
    /// open; the resync that follows retries the fetch.
    pub fn fail(&mut self, mode: SyncMode, error: &dyn fmt::Display) {
        tracing::warn!(%mode, "history fetch failed: {}", error);
        if mode == SyncMode::Cold && self.cold == ColdLoad::InFlight {
            self.cold = ColdLoad::Done;
        }
    }
}

#[cfg(test)]
mod tests {
    use deskchat_proto::MessageKind;

    use super::*;

    fn msg(ts: &str, sender: &str) -> Message {
        Message {
            id: ts.into(),
            sender: sender.into(),
            display_name: sender.into(),
            avatar_url: None,
            content: format!("from {sender}"),
            kind: MessageKind::Text,
            timestamp: ts.into(),
            attachment_id: None,
        }
    }

    #[test]
    fn cold_load_is_claimed_once() {
        let mut sync = HistorySynchronizer::new();
        assert!(sync.begin_cold());
        assert!(!sync.begin_cold());
        assert!(!sync.cold_loaded());

        sync.apply(SyncMode::Cold, vec![], &mut MessageStore::new());
        assert!(sync.cold_loaded());
        assert!(!sync.begin_cold());
    }

    #[test]
    fn cold_replaces_store() {
        let mut sync = HistorySynchronizer::new();
        let mut store = MessageStore::new();
        store.upsert(msg("t9", "stale"));

        sync.begin_cold();
        sync.apply(SyncMode::Cold, vec![msg("t2", "b"), msg("t1", "a")], &mut store);

        let ids: Vec<_> = store.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["t1", "t2"]);
    }

    #[test]
    fn resync_retains_live_only_messages() {
        let mut sync = HistorySynchronizer::new();
        let mut store = MessageStore::new();
        sync.begin_cold();
        sync.apply(SyncMode::Cold, vec![msg("A", "a")], &mut store);
        store.insert_live(msg("B", "b"));

        sync.apply(SyncMode::Resync, vec![msg("A", "a")], &mut store);

        let ids: Vec<_> = store.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
    }

    #[test]
    fn failure_leaves_store_and_settles_cold() {
        let mut sync = HistorySynchronizer::new();
        let mut store = MessageStore::new();
        store.upsert(msg("t1", "a"));

        sync.fail(SyncMode::Resync, &"boom");
        assert!(!sync.cold_loaded());

        sync.begin_cold();
        sync.fail(SyncMode::Cold, &"connection refused");
        assert!(sync.cold_loaded());
        assert_eq!(store.len(), 1);
    }
}
