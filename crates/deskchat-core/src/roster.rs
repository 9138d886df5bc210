//! User roster and raw-record mapping.
//!
//! The roster is supplied externally and is read-only here. [`MessageMapper`]
//! combines it with a [`UrlNormalizer`] to turn wire records into
//! display-ready [`Message`]s.

use deskchat_proto::{MessageKind, RawMessage, RosterRecord};

use crate::Message;

/// A known user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Login name.
    pub username: String,
    /// Human-readable name.
    pub display_name: String,
    /// Raw avatar reference (not yet normalized).
    pub avatar_url: Option<String>,
}

impl RosterEntry {
    /// Entry without an avatar.
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self { username: username.into(), display_name: display_name.into(), avatar_url: None }
    }
}

impl From<RosterRecord> for RosterEntry {
    fn from(record: RosterRecord) -> Self {
        Self {
            username: record.user_name,
            display_name: record.full_name,
            avatar_url: record.image_url.filter(|url| !url.trim().is_empty()),
        }
    }
}

/// Ordered list of known users.
///
/// Order matters: mention candidates are reported in roster order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Create a roster from entries in display order.
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    /// Create a roster from wire records.
    pub fn from_records(records: impl IntoIterator<Item = RosterRecord>) -> Self {
        Self::new(records.into_iter().map(RosterEntry::from).collect())
    }

    /// Entry for `username`. `None` if the user is unknown.
    pub fn find(&self, username: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.username == username)
    }

    /// Entries in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the roster has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns attachment references into loadable URLs.
///
/// Implemented by the host; the core only decides when to call it.
pub trait UrlNormalizer {
    /// Normalize `raw` for content of the given kind.
    fn normalize(&self, raw: &str, kind: MessageKind) -> String;
}

/// Normalizer that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughUrls;

impl UrlNormalizer for PassthroughUrls {
    fn normalize(&self, raw: &str, _kind: MessageKind) -> String {
        raw.to_string()
    }
}

/// Maps wire records to display-ready messages.
#[derive(Debug, Clone)]
pub struct MessageMapper<N> {
    roster: Roster,
    normalizer: N,
}

impl<N: UrlNormalizer> MessageMapper<N> {
    /// Create a mapper over `roster`.
    pub fn new(roster: Roster, normalizer: N) -> Self {
        Self { roster, normalizer }
    }

    /// Roster used for sender resolution.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Resolve the sender and normalize attachment URLs.
    ///
    /// Unknown senders are shown by username with no avatar. Text content is
    /// never touched; image and audio content goes through the normalizer.
    pub fn map(&self, raw: RawMessage) -> Message {
        let entry = self.roster.find(&raw.user_name);

        let display_name =
            entry.map_or_else(|| raw.user_name.clone(), |e| e.display_name.clone());
        let avatar_url = entry
            .and_then(|e| e.avatar_url.as_deref())
            .map(|url| self.normalizer.normalize(url, MessageKind::Image));

        let content = match raw.message_type {
            MessageKind::Text => raw.content,
            kind @ (MessageKind::Image | MessageKind::Audio) => {
                self.normalizer.normalize(&raw.content, kind)
            },
        };

        Message {
            id: raw.timestamp.clone(),
            sender: raw.user_name,
            display_name,
            avatar_url,
            content,
            kind: raw.message_type,
            timestamp: raw.timestamp,
            attachment_id: raw.file_id,
        }
    }
}
