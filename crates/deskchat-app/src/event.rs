//! Widget input events.
//!
//! Events originate from two sources:
//! - User interaction (keys, whole-buffer edits).
//! - Completions of I/O the widget requested (HTTP, socket, timer).

use deskchat_core::{MessageId, SocketId, SyncMode};
use deskchat_proto::RawMessage;

use crate::{KeyInput, SendId};

/// Events processed by the widget.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// Keyboard input on the compose buffer.
    Key(KeyInput),

    /// Compose buffer replaced wholesale (line-oriented frontends).
    SetText(String),

    /// History fetch settled.
    HistoryFetched {
        /// Which fetch this answers.
        mode: SyncMode,
        /// Decoded records, or a description of the failure.
        result: Result<Vec<RawMessage>, String>,
    },

    /// Socket finished opening.
    SocketOpened {
        /// Socket that opened.
        socket: SocketId,
    },

    /// Socket closed (or failed to open).
    SocketClosed {
        /// Socket that closed.
        socket: SocketId,
        /// Close code; 1006 when no close frame was received.
        code: u16,
    },

    /// Socket reported an error. The following close is authoritative.
    SocketError {
        /// Socket that failed.
        socket: SocketId,
        /// Error description.
        message: String,
    },

    /// Text frame received.
    FrameReceived {
        /// Socket that delivered the frame.
        socket: SocketId,
        /// Raw frame text.
        text: String,
    },

    /// Reconnect timer fired.
    ReconnectDue,

    /// Send request settled.
    SendFinished {
        /// Correlation id from [`crate::ChatAction::Send`].
        send_id: SendId,
        /// `Err` carries the user-facing message.
        result: Result<(), String>,
    },

    /// Delete request settled.
    DeleteFinished {
        /// Message the request was for.
        id: MessageId,
        /// `Err` carries the user-facing message.
        result: Result<(), String>,
    },
}
