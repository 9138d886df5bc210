//! Socket lifecycle state machine.
//!
//! Maintains at most one live connection to the message stream and recovers
//! from drops with a fixed-delay retry. Uses the action pattern: methods take
//! time as input and return actions for the driver to execute, so the state
//! machine stays pure.
//!
//! # State Machine
//!
//! ```text
//!                 open()               opened
//! ┌──────────────┐─────>┌────────────┐──────>┌───────────┐
//! │ Disconnected │      │ Connecting │       │ Connected │
//! └──────────────┘<─────└────────────┘       └───────────┘
//!        ^  │      closed                          │
//!        │  │ reconnect_due (after delay)          │ closed
//!        │  └──> open()                            │
//!        └─────────────────────────────────────────┘
//! ```
//!
//! Every socket gets a fresh [`SocketId`]. Events from any socket other than
//! the current one are stale and ignored, so a late close from a replaced
//! connection can never schedule a second retry.

use std::{
    fmt,
    ops::Sub,
    time::{Duration, Instant},
};

use deskchat_proto::close_code;

/// Fixed delay between an unclean close and the next connection attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Identity of one socket attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(u64);

impl SocketId {
    /// Raw attempt number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket, or the last one closed.
    Disconnected,
    /// Socket requested, waiting for it to open.
    Connecting,
    /// Socket open and delivering frames.
    Connected,
}

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Establish a socket and report its events under `socket`.
    OpenSocket {
        /// Identity for the new socket's events
        socket: SocketId,
    },

    /// Stop delivering events from `socket`.
    DetachSocket {
        /// Socket to detach
        socket: SocketId,
    },

    /// Close `socket` with `code`.
    CloseSocket {
        /// Socket to close
        socket: SocketId,
        /// WebSocket close code
        code: u16,
    },

    /// Arm the reconnect timer, replacing any pending one.
    ScheduleReconnect {
        /// Time until the reconnect fires
        delay: Duration,
    },

    /// Disarm the reconnect timer.
    CancelReconnect,

    /// Fetch history and merge it to fill the gap while disconnected.
    Resync,
}

/// Connection state machine.
///
/// Pure state machine: no I/O, no clock. Time is passed to the methods that
/// need it. Generic over `Instant` so tests can drive a manual clock.
#[derive(Debug, Clone)]
pub struct ConnectionManager<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    state: ConnectionState,
    reconnect_delay: Duration,
    /// Socket whose events are currently accepted.
    current: Option<SocketId>,
    next_socket: u64,
    /// When the pending retry was scheduled. `None` if no retry is pending.
    retry_scheduled_at: Option<I>,
    /// Set by `shutdown`; nothing reconnects afterwards.
    shut_down: bool,
}

impl<I> Default for ConnectionManager<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new(RECONNECT_DELAY)
    }
}

impl<I> ConnectionManager<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a manager in [`ConnectionState::Disconnected`].
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_delay,
            current: None,
            next_socket: 1,
            retry_scheduled_at: None,
            shut_down: false,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Socket whose events are accepted. `None` if no socket is live.
    #[must_use]
    pub fn current_socket(&self) -> Option<SocketId> {
        self.current
    }

    /// True if a reconnect is scheduled.
    #[must_use]
    pub fn reconnect_pending(&self) -> bool {
        self.retry_scheduled_at.is_some()
    }

    /// True after [`ConnectionManager::shutdown`].
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Delay used between an unclean close and the next attempt.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Start a connection attempt.
    ///
    /// No-op unless [`ConnectionState::Disconnected`] and not shut down. A
    /// pending retry is cancelled since this attempt supersedes it.
    pub fn open(&mut self) -> Vec<ConnectionAction> {
        if self.shut_down || self.state != ConnectionState::Disconnected {
            tracing::debug!(state = ?self.state, shut_down = self.shut_down, "open ignored");
            return vec![];
        }

        let socket = SocketId(self.next_socket);
        self.next_socket += 1;
        self.current = Some(socket);
        self.state = ConnectionState::Connecting;

        let mut actions = Vec::with_capacity(2);
        if self.retry_scheduled_at.take().is_some() {
            actions.push(ConnectionAction::CancelReconnect);
        }
        actions.push(ConnectionAction::OpenSocket { socket });

        tracing::info!(%socket, "connecting");
        actions
    }

    /// Socket finished opening.
    ///
    /// Returns [`ConnectionAction::Resync`] so history missed while
    /// disconnected is merged in.
    pub fn handle_opened(&mut self, socket: SocketId) -> Vec<ConnectionAction> {
        if !self.accepts(socket) || self.state != ConnectionState::Connecting {
            tracing::debug!(%socket, state = ?self.state, "ignoring stale open");
            return vec![];
        }

        self.state = ConnectionState::Connected;
        tracing::info!(%socket, "connected");
        vec![ConnectionAction::Resync]
    }

    /// Socket closed with `code`.
    ///
    /// Schedules exactly one retry after the fixed delay unless the close was
    /// a clean shutdown ([`close_code::NORMAL`]).
    pub fn handle_closed(&mut self, socket: SocketId, code: u16, now: I) -> Vec<ConnectionAction> {
        if !self.accepts(socket) {
            tracing::debug!(%socket, code, "ignoring stale close");
            return vec![];
        }

        self.current = None;
        self.state = ConnectionState::Disconnected;

        if close_code::is_clean_shutdown(code) {
            tracing::info!(%socket, code, "socket closed cleanly");
            return vec![];
        }

        tracing::warn!(%socket, code, delay = ?self.reconnect_delay, "socket closed, reconnecting");
        self.retry_scheduled_at = Some(now);
        vec![ConnectionAction::ScheduleReconnect { delay: self.reconnect_delay }]
    }

    /// Socket reported an error.
    ///
    /// Logged only: the close event that follows decides state and retries.
    pub fn handle_error(&self, socket: SocketId, error: &dyn fmt::Display) {
        if self.accepts(socket) {
            tracing::warn!(%socket, "socket error: {}", error);
        } else {
            tracing::debug!(%socket, "ignoring stale error: {}", error);
        }
    }

    /// Reconnect timer fired.
    ///
    /// Ignored if no retry is pending. A fire that arrives before the delay
    /// has elapsed since scheduling re-arms the timer for the remainder, so
    /// the retry stays pending.
    pub fn reconnect_due(&mut self, now: I) -> Vec<ConnectionAction> {
        let Some(scheduled_at) = self.retry_scheduled_at else {
            tracing::debug!("reconnect fired with nothing pending");
            return vec![];
        };

        let elapsed = now - scheduled_at;
        if elapsed < self.reconnect_delay {
            let remaining = self.reconnect_delay - elapsed;
            tracing::debug!(?elapsed, ?remaining, "reconnect fired early, re-arming");
            return vec![ConnectionAction::ScheduleReconnect { delay: remaining }];
        }

        self.retry_scheduled_at = None;
        self.open()
    }

    /// Tear down for good.
    ///
    /// Returns, in order: detach the live socket, close it with
    /// [`close_code::NORMAL`], and cancel any pending retry. Idempotent.
    pub fn shutdown(&mut self) -> Vec<ConnectionAction> {
        if self.shut_down {
            return vec![];
        }
        self.shut_down = true;
        self.state = ConnectionState::Disconnected;
        self.retry_scheduled_at = None;

        let mut actions = Vec::with_capacity(3);
        if let Some(socket) = self.current.take() {
            actions.push(ConnectionAction::DetachSocket { socket });
            actions.push(ConnectionAction::CloseSocket { socket, code: close_code::NORMAL });
        }
        actions.push(ConnectionAction::CancelReconnect);

        tracing::info!("connection shut down");
        actions
    }

    fn accepts(&self, socket: SocketId) -> bool {
        !self.shut_down && self.current == Some(socket)
    }
}
