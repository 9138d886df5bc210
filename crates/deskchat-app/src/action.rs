//! Widget side-effects and intents.
//!
//! [`ChatAction`]s are instructions produced by the [`crate::ChatWidget`] for
//! the runtime to execute, in the order returned.

use std::{fmt, time::Duration};

use deskchat_core::{SocketId, SyncMode};
use deskchat_proto::{DeleteRequest, SendRequest};

/// Correlates a send request with its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SendId(pub(crate) u64);

impl fmt::Display for SendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "send#{}", self.0)
    }
}

/// Actions produced by the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// Re-render the view.
    Render,

    /// Fetch message history and report it as
    /// [`crate::ChatEvent::HistoryFetched`].
    FetchHistory {
        /// Cold load or resync.
        mode: SyncMode,
    },

    /// Open the chat socket, tagging its events with `socket`.
    OpenSocket {
        /// Identity for the new socket's events.
        socket: SocketId,
    },

    /// Stop delivering events from `socket`.
    DetachSocket {
        /// Socket to detach.
        socket: SocketId,
    },

    /// Close `socket` with `code`.
    CloseSocket {
        /// Socket to close.
        socket: SocketId,
        /// WebSocket close code.
        code: u16,
    },

    /// Arm the reconnect timer, replacing any pending one.
    ScheduleReconnect {
        /// Time until [`crate::ChatEvent::ReconnectDue`].
        delay: Duration,
    },

    /// Disarm the reconnect timer.
    CancelReconnect,

    /// `POST /api/chat/send`; report as [`crate::ChatEvent::SendFinished`].
    Send {
        /// Correlation id.
        send_id: SendId,
        /// Request body.
        request: SendRequest,
    },

    /// `POST /api/chat/delete`; report as
    /// [`crate::ChatEvent::DeleteFinished`].
    Delete {
        /// Request body.
        request: DeleteRequest,
    },

    /// Show a blocking, user-visible alert.
    Alert {
        /// Human-readable message.
        message: String,
    },
}
