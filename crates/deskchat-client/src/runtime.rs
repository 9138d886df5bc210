//! Async runtime.
//!
//! Event loop that carries out the widget's actions and feeds their results
//! back as events. Uses `tokio::select!` over three sources:
//!
//! - user input from the frontend
//! - socket events from the transport
//! - completions of HTTP tasks and the reconnect timer
//!
//! HTTP calls run as spawned tasks; their results come back through the
//! completion channel. Once the widget is closed it ignores them.

use deskchat_app::{ChatAction, ChatEvent, ChatWidget, KeyInput, SendId, View};
use deskchat_core::{Environment, MessageId, MessageMapper, NotificationGate, SocketId, SyncMode};
use deskchat_proto::{DeleteRequest, MessageKind, SendRequest, close_code};
use tokio::sync::mpsc;
use url::Url;

use crate::{
    ChatApi, ClientConfig, MediaUrls, RuntimeError, SystemEnv,
    timer::Cancelable,
    transport::{self, SocketEvent, SocketEvents, SocketHandle},
};

/// Input from the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Append a line to the draft and send it, unless the line opened a
    /// mention popup. An empty line sends the draft as it stands.
    Line(String),
    /// Single key on the compose buffer.
    Key(KeyInput),
    /// Commit mention candidate at this index.
    PickMention(usize),
    /// Send an attachment reference.
    SendMedia {
        /// Image or audio.
        kind: MessageKind,
        /// Attachment URL or data.
        content: String,
        /// MIME type, when known.
        mime_type: Option<String>,
    },
    /// Delete a message by id.
    Delete(MessageId),
    /// Flip the mute flag.
    ToggleMute,
    /// Close the widget and stop.
    Quit,
}

/// Drives a [`ChatWidget`] against the real backend.
pub struct Runtime<V, E = SystemEnv>
where
    V: View,
    E: Environment,
{
    env: E,
    view: V,
    widget: ChatWidget<E::Instant, MediaUrls>,
    api: ChatApi,
    ws_url: Url,
    socket: Option<SocketHandle>,
    timer: Cancelable<E>,
    socket_tx: SocketEvents,
    socket_rx: mpsc::UnboundedReceiver<(SocketId, SocketEvent)>,
    completions_tx: mpsc::UnboundedSender<ChatEvent>,
    completions_rx: mpsc::UnboundedReceiver<ChatEvent>,
}

impl<V: View> Runtime<V> {
    /// Runtime on system time.
    pub fn new(config: &ClientConfig, gate: NotificationGate, view: V) -> Result<Self, RuntimeError> {
        Self::with_env(SystemEnv::new(), config, gate, view)
    }
}

impl<V, E> Runtime<V, E>
where
    V: View,
    E: Environment,
{
    /// Runtime on a custom environment.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Config` if the roster cannot be loaded or the base
    ///   URL has no socket counterpart
    /// - `RuntimeError::Api` if the HTTP client cannot be built
    pub fn with_env(
        env: E,
        config: &ClientConfig,
        gate: NotificationGate,
        view: V,
    ) -> Result<Self, RuntimeError> {
        let roster = config.load_roster()?;
        let mapper = MessageMapper::new(roster, MediaUrls::new(config.base_url.clone()));
        let widget = ChatWidget::new(config.username.clone(), mapper, gate)
            .with_reconnect_delay(config.reconnect_delay);

        let (socket_tx, socket_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Ok(Self {
            timer: Cancelable::new(env.clone()),
            env,
            view,
            widget,
            api: ChatApi::new(config)?,
            ws_url: config.ws_url()?,
            socket: None,
            socket_tx,
            socket_rx,
            completions_tx,
            completions_rx,
        })
    }

    /// Run until [`UserInput::Quit`] or the input channel closes.
    ///
    /// The widget is closed on the way out: the socket is detached and closed
    /// with 1000, and the reconnect timer is cancelled.
    pub async fn run(mut self, mut input: mpsc::Receiver<UserInput>) -> Result<(), RuntimeError> {
        let actions = self.widget.open();
        self.process_actions(actions)?;

        while !self.widget.is_closed() {
            tokio::select! {
                maybe_input = input.recv() => {
                    let actions = match maybe_input {
                        Some(input) => self.handle_input(input),
                        None => self.widget.close(),
                    };
                    self.process_actions(actions)?;
                }

                Some((socket, event)) = self.socket_rx.recv() => {
                    let event = match event {
                        SocketEvent::Opened => ChatEvent::SocketOpened { socket },
                        SocketEvent::Frame(text) => ChatEvent::FrameReceived { socket, text },
                        SocketEvent::Error(message) => ChatEvent::SocketError { socket, message },
                        SocketEvent::Closed(code) => ChatEvent::SocketClosed { socket, code },
                    };
                    let actions = self.widget.handle(event, self.env.now());
                    self.process_actions(actions)?;
                }

                Some(event) = self.completions_rx.recv() => {
                    let actions = self.widget.handle(event, self.env.now());
                    self.process_actions(actions)?;
                }
            }
        }

        tracing::info!("chat closed");
        Ok(())
    }

    fn handle_input(&mut self, input: UserInput) -> Vec<ChatAction> {
        let now = self.env.now();
        match input {
            UserInput::Line(line) if line.is_empty() => self.widget.send_text(),
            UserInput::Line(line) => {
                let text = format!("{}{line}", self.widget.compose().text());
                let mut actions = self.widget.handle(ChatEvent::SetText(text), now);
                if !self.widget.mentions().is_open() {
                    actions.extend(self.widget.send_text());
                }
                actions
            },
            UserInput::Key(key) => self.widget.handle(ChatEvent::Key(key), now),
            UserInput::PickMention(index) => self.widget.pick_mention(index),
            UserInput::SendMedia { kind, content, mime_type } => {
                self.widget.send_media(kind, content, mime_type)
            },
            UserInput::Delete(id) => self.widget.delete(&id),
            UserInput::ToggleMute => self.widget.toggle_mute(),
            UserInput::Quit => self.widget.close(),
        }
    }

    /// Execute actions in order.
    fn process_actions(&mut self, actions: Vec<ChatAction>) -> Result<(), RuntimeError> {
        for action in actions {
            match action {
                ChatAction::Render => {
                    self.view.render(&self.widget.view()).map_err(|e| RuntimeError::View(Box::new(e)))?;
                },
                ChatAction::Alert { message } => {
                    self.view.alert(&message).map_err(|e| RuntimeError::View(Box::new(e)))?;
                },
                ChatAction::FetchHistory { mode } => self.spawn_fetch(mode),
                ChatAction::OpenSocket { socket } => {
                    let handle = transport::connect(self.ws_url.clone(), socket, self.socket_tx.clone());
                    if let Some(old) = self.socket.replace(handle) {
                        old.detach();
                        old.stop();
                    }
                },
                ChatAction::DetachSocket { socket } => {
                    if let Some(handle) = self.socket.as_ref().filter(|h| h.socket() == socket) {
                        handle.detach();
                    }
                },
                ChatAction::CloseSocket { socket, code } => {
                    if let Some(handle) = self.socket.take_if(|h| h.socket() == socket) {
                        handle.close(code);
                    }
                },
                ChatAction::ScheduleReconnect { delay } => {
                    let tx = self.completions_tx.clone();
                    self.timer.schedule(delay, move || {
                        let _ = tx.send(ChatEvent::ReconnectDue);
                    });
                },
                ChatAction::CancelReconnect => self.timer.cancel(),
                ChatAction::Send { send_id, request } => self.spawn_send(send_id, request),
                ChatAction::Delete { request } => self.spawn_delete(request),
            }
        }
        Ok(())
    }

    fn spawn_fetch(&self, mode: SyncMode) {
        let api = self.api.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_history().await.map_err(|e| e.to_string());
            let _ = tx.send(ChatEvent::HistoryFetched { mode, result });
        });
    }

    fn spawn_send(&self, send_id: SendId, request: SendRequest) {
        let api = self.api.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = api.send(&request).await.map_err(|e| {
                tracing::debug!(%send_id, "send error: {:?}", e);
                e.user_message()
            });
            let _ = tx.send(ChatEvent::SendFinished { send_id, result });
        });
    }

    fn spawn_delete(&self, request: DeleteRequest) {
        let api = self.api.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = api.delete(&request).await.map_err(|e| {
                tracing::debug!(id = %request.timestamp, "delete error: {:?}", e);
                e.user_message()
            });
            let _ = tx.send(ChatEvent::DeleteFinished { id: request.timestamp, result });
        });
    }
}

impl<V, E> Drop for Runtime<V, E>
where
    V: View,
    E: Environment,
{
    fn drop(&mut self) {
        if let Some(handle) = self.socket.take() {
            handle.detach();
            handle.close(close_code::NORMAL);
        }
    }
}
