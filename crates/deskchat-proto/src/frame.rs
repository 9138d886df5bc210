//! Live frames delivered over the chat WebSocket.
//!
//! Frames are JSON objects of the form `{"action": ..., "payload": ...}`. The
//! client understands two actions; everything else decodes to an error that
//! callers log and drop.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    RawMessage,
    errors::{ProtocolError, Result},
};

/// Payload of a `delete_message` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePayload {
    /// Identity (timestamp) of the message that was deleted.
    pub timestamp: String,
}

/// A frame received from the chat socket.
///
/// # Invariants
///
/// Decoding is total: [`ServerFrame::parse`] never panics, and any input that
/// is not one of the known variants yields a [`ProtocolError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A message was posted.
    NewMessage(RawMessage),
    /// A message was deleted.
    DeleteMessage(DeletePayload),
}

impl ServerFrame {
    /// Wire name of the frame action.
    pub fn action(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "new_message",
            Self::DeleteMessage(_) => "delete_message",
        }
    }

    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Json` if the text is not JSON or the payload does not
    ///   match the action
    /// - `ProtocolError::MissingAction` if there is no string `action`
    /// - `ProtocolError::UnknownAction` for any other action
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let action = match value.get("action") {
            Some(Value::String(action)) => action.as_str(),
            _ => return Err(ProtocolError::MissingAction),
        };

        match action {
            "new_message" | "delete_message" => Ok(serde_json::from_value(value)?),
            other => Err(ProtocolError::UnknownAction(other.to_owned())),
        }
    }
}
