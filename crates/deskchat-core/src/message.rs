//! Display-ready chat messages.

use deskchat_proto::MessageKind;

/// Message identity: the server-assigned timestamp string.
pub type MessageId = String;

/// A chat message as rendered by the UI.
///
/// Messages are immutable once constructed. The store only ever adds,
/// replaces or removes whole messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique identity (server timestamp).
    pub id: MessageId,
    /// Sender username.
    pub sender: String,
    /// Sender display name resolved from the roster, or the username.
    pub display_name: String,
    /// Normalized avatar URL. `None` if the sender has no avatar.
    pub avatar_url: Option<String>,
    /// Text, or a normalized URL for media kinds.
    pub content: String,
    /// Content kind.
    pub kind: MessageKind,
    /// ISO-8601 timestamp; the sort key.
    pub timestamp: String,
    /// External storage reference used when deleting attachments.
    pub attachment_id: Option<String>,
}

impl Message {
    /// Sort key: timestamp first, identity as tie-breaker.
    pub(crate) fn sort_key(&self) -> (&str, &str) {
        (&self.timestamp, &self.id)
    }
}
