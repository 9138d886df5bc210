//! WebSocket transport.
//!
//! [`connect`] spawns a task that owns one socket and forwards its lifecycle
//! to a shared channel, tagged with the [`SocketId`] the widget assigned. The
//! task always ends with exactly one [`SocketEvent::Closed`], unless the
//! handle was detached first.
//!
//! # Close codes
//!
//! - A close frame reports its own code, or 1005 when it carries none.
//! - A stream that ends or fails without a close frame reports 1006.
//! - A close requested through [`SocketHandle::close`] reports that code.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use deskchat_core::SocketId;
use deskchat_proto::close_code;
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::AbortHandle};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};
use url::Url;

use crate::TransportError;

/// Lifecycle of one socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Handshake completed.
    Opened,
    /// Text frame received.
    Frame(String),
    /// Connect or stream failure. A `Closed` follows.
    Error(String),
    /// Socket is gone.
    Closed(u16),
}

/// Sender half of the shared socket event channel.
pub type SocketEvents = mpsc::UnboundedSender<(SocketId, SocketEvent)>;

enum SocketCommand {
    Close(u16),
}

/// Handle to a socket task.
#[derive(Debug)]
pub struct SocketHandle {
    socket: SocketId,
    commands: mpsc::UnboundedSender<SocketCommand>,
    detached: Arc<AtomicBool>,
    abort_handle: AbortHandle,
}

impl SocketHandle {
    /// Identity this socket's events carry.
    pub fn socket(&self) -> SocketId {
        self.socket
    }

    /// Stop forwarding events. The socket itself stays up until closed.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    /// Close the socket with `code`.
    ///
    /// If the task is already gone this does nothing.
    pub fn close(&self, code: u16) {
        if self.commands.send(SocketCommand::Close(code)).is_err() {
            tracing::debug!(socket = %self.socket, "close on finished socket");
        }
    }

    /// Kill the socket task without a close handshake.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Open a socket to `url` in the background.
///
/// Must be called inside a tokio runtime.
pub fn connect(url: Url, socket: SocketId, events: SocketEvents) -> SocketHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let detached = Arc::new(AtomicBool::new(false));

    let forwarder = Forwarder { socket, events, detached: Arc::clone(&detached) };
    let handle = tokio::spawn(run_socket(url, forwarder, commands_rx));

    SocketHandle { socket, commands: commands_tx, detached, abort_handle: handle.abort_handle() }
}

struct Forwarder {
    socket: SocketId,
    events: SocketEvents,
    detached: Arc<AtomicBool>,
}

impl Forwarder {
    fn send(&self, event: SocketEvent) {
        if self.detached.load(Ordering::SeqCst) {
            tracing::debug!(socket = %self.socket, ?event, "socket detached, dropping event");
            return;
        }
        if self.events.send((self.socket, event)).is_err() {
            tracing::debug!(socket = %self.socket, "event channel closed");
        }
    }
}

async fn run_socket(
    url: Url,
    forwarder: Forwarder,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
) {
    let socket = forwarder.socket;
    tracing::debug!(%socket, %url, "connecting");

    let connected = tokio::select! {
        result = connect_async(url.as_str()) => result,
        Some(SocketCommand::Close(code)) = commands.recv() => {
            forwarder.send(SocketEvent::Closed(code));
            return;
        }
    };

    let ws = match connected {
        Ok((ws, _)) => ws,
        Err(e) => {
            tracing::warn!(%socket, "Socket connect failed: {:?}", e);
            forwarder.send(SocketEvent::Error(TransportError::Connection(e.to_string()).to_string()));
            forwarder.send(SocketEvent::Closed(close_code::ABNORMAL));
            return;
        },
    };

    forwarder.send(SocketEvent::Opened);
    let (mut write, mut read) = ws.split();

    let code = loop {
        tokio::select! {
            command = commands.recv() => {
                let code = match command {
                    Some(SocketCommand::Close(code)) => code,
                    None => close_code::NORMAL,
                };
                let frame = CloseFrame { code: CloseCode::from(code), reason: "".into() };
                if let Err(e) = write.send(Message::Close(Some(frame))).await {
                    tracing::debug!(%socket, "close frame not delivered: {:?}", e);
                }
                break code;
            }

            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => forwarder.send(SocketEvent::Frame(text.as_str().to_owned())),
                Some(Ok(Message::Close(frame))) => {
                    break frame.map_or(close_code::NO_STATUS, |f| u16::from(f.code));
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    tracing::warn!(%socket, "Socket stream error: {:?}", e);
                    forwarder.send(SocketEvent::Error(TransportError::Stream(e.to_string()).to_string()));
                    break close_code::ABNORMAL;
                },
                None => break close_code::ABNORMAL,
            }
        }
    };

    tracing::debug!(%socket, code, "socket closed");
    forwarder.send(SocketEvent::Closed(code));
}
