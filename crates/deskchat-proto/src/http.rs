//! HTTP request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    MessageKind, RawMessage,
    errors::{ProtocolError, Result},
};

/// Value of `status` in a successful response envelope.
pub const STATUS_SUCCESS: &str = "success";

/// Endpoint paths relative to the backend base URL.
pub mod endpoints {
    /// `GET`: full message history.
    pub const MESSAGES: &str = "api/chat/messages";
    /// `POST`: send a message.
    pub const SEND: &str = "api/chat/send";
    /// `POST`: delete a message.
    pub const DELETE: &str = "api/chat/delete";
    /// WebSocket upgrade for the live stream.
    pub const SOCKET: &str = "api/chat/ws";
}

/// Envelope of `GET /api/chat/messages`.
///
/// Records are kept as raw JSON so one malformed record does not fail the
/// whole history.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    /// `"success"` on success.
    pub status: String,
    /// Message records.
    #[serde(default)]
    pub data: Vec<Value>,
}

/// History records split into decodable messages and rejects.
#[derive(Debug, Default)]
pub struct DecodedHistory {
    /// Records that decoded cleanly, in server order.
    pub messages: Vec<RawMessage>,
    /// Decode errors for records that were skipped.
    pub rejected: Vec<ProtocolError>,
}

impl HistoryResponse {
    /// Decode a response body.
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Decode each record individually.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnexpectedStatus` if the envelope is not a success
    pub fn into_messages(self) -> Result<DecodedHistory> {
        if self.status != STATUS_SUCCESS {
            return Err(ProtocolError::UnexpectedStatus(self.status));
        }

        let mut decoded = DecodedHistory::default();
        for record in self.data {
            match serde_json::from_value::<RawMessage>(record) {
                Ok(message) => decoded.messages.push(message),
                Err(e) => decoded.rejected.push(e.into()),
            }
        }
        Ok(decoded)
    }
}

/// Body of `POST /api/chat/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Sender username (the current user).
    pub user_name: String,
    /// Content kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Text or attachment payload.
    pub content: String,
    /// MIME type of an attachment, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Body of `POST /api/chat/delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// Identity of the message to delete.
    pub timestamp: String,
    /// Attachment reference to remove from external storage.
    #[serde(rename = "fileID", skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

/// Minimal view of a response envelope, used to detect error envelopes
/// returned with a 2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusBody {
    /// Reported status, if any.
    #[serde(default)]
    pub status: Option<String>,
}

impl StatusBody {
    /// Whether `body` reports a failure despite a 2xx status.
    ///
    /// Bodies that are not JSON objects, or carry no `status`, count as
    /// success: the HTTP status already said so.
    pub fn reports_failure(body: &str) -> bool {
        serde_json::from_str::<StatusBody>(body)
            .ok()
            .and_then(|b| b.status)
            .is_some_and(|status| status != STATUS_SUCCESS)
    }
}
