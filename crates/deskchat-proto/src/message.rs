//! Message records as the server stores and broadcasts them.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Kind of message content.
///
/// For [`MessageKind::Image`] and [`MessageKind::Audio`] the content is a URL
/// (or storage reference) that must be normalized before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Image attachment.
    Image,
    /// Audio attachment.
    Audio,
}

impl MessageKind {
    /// Wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }

    /// True for kinds whose content is an attachment URL.
    pub fn is_media(self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message record as returned by `GET /api/chat/messages` and carried in
/// `new_message` frames.
///
/// `timestamp` doubles as the message identity: the server assigns it and it
/// is unique per message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Server-assigned ISO-8601 timestamp; also the message id.
    #[serde(rename = "Timestamp")]
    pub timestamp: String,

    /// Sender username.
    #[serde(rename = "UserName")]
    pub user_name: String,

    /// Content kind.
    #[serde(rename = "MessageType")]
    pub message_type: MessageKind,

    /// Text body, or attachment reference for media kinds.
    #[serde(rename = "Content")]
    pub content: String,

    /// External storage reference, used when deleting attachments.
    #[serde(
        rename = "FileID",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_id: Option<String>,
}

/// The backend writes `""` for messages without an attachment.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
