//! Ordered, deduplicated message collection.
//!
//! The store is the single source of truth for rendering. Messages are kept
//! in a `Vec` sorted by timestamp so iteration is always chronological and
//! inserts are a binary search plus a shift.
//!
//! # Invariants
//!
//! - No two messages share an `id`.
//! - Iteration order is ascending by `timestamp` (ISO-8601, so lexical order
//!   is chronological), with `id` breaking ties.

use crate::Message;

/// Outcome of [`MessageStore::insert_live`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveInsert {
    /// Message was not present and has been added.
    Inserted,
    /// A message with the same id but a different sender was replaced.
    Replaced,
    /// Same id and sender already present; store unchanged.
    Duplicate,
}

/// Ordered, deduplicated set of messages.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if the store holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages in ascending timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Message with the given identity. `None` if absent.
    pub fn get(&self, id: &str) -> Option<&Message> {
        self.position(id).map(|idx| &self.messages[idx])
    }

    /// True if a message with `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Insert or replace by identity.
    ///
    /// Returns `true` if an existing message was replaced.
    pub fn upsert(&mut self, message: Message) -> bool {
        let replaced = match self.position(&message.id) {
            Some(idx) => {
                self.messages.remove(idx);
                true
            },
            None => false,
        };

        let key = message.sort_key();
        let idx = self.messages.partition_point(|m| m.sort_key() < key);
        self.messages.insert(idx, message);
        replaced
    }

    /// Insert a message delivered by a live frame.
    ///
    /// Frames echoing a message already in the store (same `id` and
    /// `sender`) are discarded without mutation.
    pub fn insert_live(&mut self, message: Message) -> LiveInsert {
        if self.get(&message.id).is_some_and(|m| m.sender == message.sender) {
            return LiveInsert::Duplicate;
        }

        if self.upsert(message) { LiveInsert::Replaced } else { LiveInsert::Inserted }
    }

    /// Remove the message with `id`. No-op if absent.
    pub fn remove(&mut self, id: &str) -> Option<Message> {
        self.position(id).map(|idx| self.messages.remove(idx))
    }

    /// Replace the entire content with `messages`.
    ///
    /// Later duplicates of an id win over earlier ones.
    pub fn replace_all(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.clear();
        self.merge(messages);
    }

    /// Merge `messages` by identity, keeping everything not mentioned.
    ///
    /// Returns the number of messages that were not present before.
    pub fn merge(&mut self, messages: impl IntoIterator<Item = Message>) -> usize {
        let mut added = 0;
        for message in messages {
            if !self.upsert(message) {
                added += 1;
            }
        }
        added
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use deskchat_proto::MessageKind;

    use super::*;

    fn msg(ts: &str, sender: &str, content: &str) -> Message {
        Message {
            id: ts.to_string(),
            sender: sender.to_string(),
            display_name: sender.to_string(),
            avatar_url: None,
            content: content.to_string(),
            kind: MessageKind::Text,
            timestamp: ts.to_string(),
            attachment_id: None,
        }
    }

    fn ids(store: &MessageStore) -> Vec<&str> {
        store.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn upsert_keeps_timestamp_order() {
        let mut store = MessageStore::new();
        store.upsert(msg("2024-01-01T00:00:03Z", "a", "3"));
        store.upsert(msg("2024-01-01T00:00:01Z", "a", "1"));
        store.upsert(msg("2024-01-01T00:00:02Z", "b", "2"));

        assert_eq!(ids(&store), [
            "2024-01-01T00:00:01Z",
            "2024-01-01T00:00:02Z",
            "2024-01-01T00:00:03Z"
        ]);
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut store = MessageStore::new();
        assert!(!store.upsert(msg("t1", "a", "old")));
        assert!(store.upsert(msg("t1", "a", "new")));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("t1").map(|m| m.content.as_str()), Some("new"));
    }

    #[test]
    fn live_duplicate_is_dropped() {
        let mut store = MessageStore::new();
        store.upsert(msg("t1", "a", "from history"));

        assert_eq!(store.insert_live(msg("t1", "a", "echo")), LiveInsert::Duplicate);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("t1").map(|m| m.content.as_str()), Some("from history"));
    }

    #[test]
    fn live_same_id_other_sender_replaces() {
        let mut store = MessageStore::new();
        store.upsert(msg("t1", "a", "x"));

        assert_eq!(store.insert_live(msg("t1", "b", "y")), LiveInsert::Replaced);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("t1").map(|m| m.sender.as_str()), Some("b"));
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let mut store = MessageStore::new();
        store.upsert(msg("t1", "a", "x"));

        assert!(store.remove("t2").is_none());
        assert_eq!(store.len(), 1);
        assert!(store.remove("t1").is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn merge_keeps_unmentioned_messages() {
        let mut store = MessageStore::new();
        store.upsert(msg("t1", "a", "A"));
        store.upsert(msg("t2", "b", "B"));

        let added = store.merge([msg("t1", "a", "A'"), msg("t0", "c", "Z")]);

        assert_eq!(added, 1);
        assert_eq!(ids(&store), ["t0", "t1", "t2"]);
        assert_eq!(store.get("t1").map(|m| m.content.as_str()), Some("A'"));
    }

    #[test]
    fn replace_all_drops_everything_else() {
        let mut store = MessageStore::new();
        store.upsert(msg("t1", "a", "A"));
        store.upsert(msg("t2", "b", "B"));

        store.replace_all([msg("t3", "c", "C"), msg("t3", "c", "C'")]);

        assert_eq!(ids(&store), ["t3"]);
        assert_eq!(store.get("t3").map(|m| m.content.as_str()), Some("C'"));
    }
}
