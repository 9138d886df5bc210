//! Chat widget state machine.
//!
//! This module defines [`ChatWidget`], which wires the core components
//! together behind a single event/action interface. It performs no I/O: it
//! consumes [`ChatEvent`]s and produces [`ChatAction`]s for the runtime to
//! execute.
//!
//! # Responsibilities
//!
//! - Gates the socket behind the cold history load.
//! - Feeds live frames into the store and the notification gate.
//! - Runs the compose buffer and mention popup.
//! - Turns send/delete intents into requests, restoring drafts and raising
//!   alerts when they fail.
//!
//! # Lifetime
//!
//! A widget is opened once. After [`ChatWidget::close`], every event is
//! ignored, including late HTTP completions and timer fires.

use std::{
    collections::HashMap,
    ops::Sub,
    time::{Duration, Instant},
};

use deskchat_core::{
    ConnectionAction, ConnectionManager, ConnectionState, HistorySynchronizer, LiveInsert,
    MentionSuggester, MessageMapper, MessageStore, NotificationGate, PassthroughUrls,
    RECONNECT_DELAY, SyncMode, UrlNormalizer,
};
use deskchat_proto::{DeleteRequest, MessageKind, SendRequest, ServerFrame};

use crate::{ChatAction, ChatEvent, ChatView, ComposeBuffer, KeyInput, SendId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Unmounted,
    Open,
    Closed,
}

/// Chat widget state machine.
///
/// Generic over `Instant` (so tests can drive a manual clock) and over the
/// attachment URL normalizer.
#[derive(Debug)]
pub struct ChatWidget<I = Instant, N = PassthroughUrls>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    username: String,
    lifecycle: Lifecycle,
    store: MessageStore,
    history: HistorySynchronizer,
    connection: ConnectionManager<I>,
    mentions: MentionSuggester,
    gate: NotificationGate,
    mapper: MessageMapper<N>,
    compose: ComposeBuffer,
    /// In-flight sends. `Some(draft)` for text sends whose buffer was cleared.
    pending_sends: HashMap<SendId, Option<String>>,
    next_send: u64,
}

impl<I, N> ChatWidget<I, N>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
    N: UrlNormalizer,
{
    /// Create an unopened widget for `username`.
    pub fn new(username: impl Into<String>, mapper: MessageMapper<N>, gate: NotificationGate) -> Self {
        let username = username.into();
        Self {
            mentions: MentionSuggester::new(username.clone()),
            username,
            lifecycle: Lifecycle::Unmounted,
            store: MessageStore::new(),
            history: HistorySynchronizer::new(),
            connection: ConnectionManager::new(RECONNECT_DELAY),
            gate,
            mapper,
            compose: ComposeBuffer::new(),
            pending_sends: HashMap::new(),
            next_send: 1,
        }
    }

    /// Override the delay between an unclean close and the next attempt.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.connection = ConnectionManager::new(delay);
        self
    }

    /// Open the widget and start the cold history load.
    ///
    /// Only the first call does anything.
    pub fn open(&mut self) -> Vec<ChatAction> {
        if self.lifecycle != Lifecycle::Unmounted {
            return vec![];
        }
        self.lifecycle = Lifecycle::Open;

        let mut actions = Vec::new();
        if self.history.begin_cold() {
            actions.push(ChatAction::FetchHistory { mode: SyncMode::Cold });
        }
        actions.push(ChatAction::Render);
        actions
    }

    /// Close the widget for good.
    ///
    /// Returns, in order: detach the socket, close it with code 1000, cancel
    /// the reconnect timer.
    pub fn close(&mut self) -> Vec<ChatAction> {
        match self.lifecycle {
            Lifecycle::Closed => vec![],
            Lifecycle::Unmounted => {
                self.lifecycle = Lifecycle::Closed;
                vec![]
            },
            Lifecycle::Open => {
                self.lifecycle = Lifecycle::Closed;
                self.pending_sends.clear();
                self.mentions.dismiss();
                let actions = self.connection.shutdown();
                Self::connection_actions(actions)
            },
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ChatEvent, now: I) -> Vec<ChatAction> {
        if self.lifecycle != Lifecycle::Open {
            tracing::debug!(?event, "widget not open, ignoring event");
            return vec![];
        }

        match event {
            ChatEvent::Key(key) => self.handle_key(key),
            ChatEvent::SetText(text) => {
                self.compose.set(text);
                self.refresh_mentions();
                vec![ChatAction::Render]
            },
            ChatEvent::HistoryFetched { mode, result } => self.handle_history(mode, result),
            ChatEvent::SocketOpened { socket } => {
                let actions = self.connection.handle_opened(socket);
                Self::with_render(Self::connection_actions(actions))
            },
            ChatEvent::SocketClosed { socket, code } => {
                let actions = self.connection.handle_closed(socket, code, now);
                Self::with_render(Self::connection_actions(actions))
            },
            ChatEvent::SocketError { socket, message } => {
                self.connection.handle_error(socket, &message);
                vec![]
            },
            ChatEvent::FrameReceived { socket, text } => {
                if self.connection.current_socket() != Some(socket) {
                    tracing::debug!(%socket, "ignoring frame from stale socket");
                    return vec![];
                }
                self.handle_frame(&text)
            },
            ChatEvent::ReconnectDue => {
                let actions = self.connection.reconnect_due(now);
                Self::with_render(Self::connection_actions(actions))
            },
            ChatEvent::SendFinished { send_id, result } => self.handle_send_finished(send_id, result),
            ChatEvent::DeleteFinished { id, result } => match result {
                Ok(()) => {
                    tracing::debug!(%id, "delete accepted, waiting for broadcast");
                    vec![]
                },
                Err(message) => {
                    tracing::warn!(%id, "delete failed: {}", message);
                    vec![ChatAction::Alert { message }]
                },
            },
        }
    }

    /// Send the compose buffer as a text message.
    ///
    /// The buffer is cleared immediately and restored if the send fails.
    /// Blank buffers are ignored. The message is not inserted locally: it
    /// appears when the socket delivers it.
    pub fn send_text(&mut self) -> Vec<ChatAction> {
        if self.lifecycle != Lifecycle::Open || self.compose.is_blank() {
            return vec![];
        }

        let draft = self.compose.take();
        self.mentions.dismiss();
        let content = draft.trim().to_string();
        let send_id = self.track_send(Some(draft));

        vec![
            ChatAction::Send {
                send_id,
                request: SendRequest {
                    user_name: self.username.clone(),
                    kind: MessageKind::Text,
                    content,
                    mime_type: None,
                },
            },
            ChatAction::Render,
        ]
    }

    /// Send an attachment reference. The compose buffer is untouched.
    pub fn send_media(
        &mut self,
        kind: MessageKind,
        content: impl Into<String>,
        mime_type: Option<String>,
    ) -> Vec<ChatAction> {
        let content = content.into();
        if self.lifecycle != Lifecycle::Open || content.trim().is_empty() {
            return vec![];
        }

        let send_id = self.track_send(None);
        vec![ChatAction::Send {
            send_id,
            request: SendRequest { user_name: self.username.clone(), kind, content, mime_type },
        }]
    }

    /// Request deletion of message `id`.
    ///
    /// The message stays visible until the matching `delete_message` frame
    /// arrives.
    pub fn delete(&mut self, id: &str) -> Vec<ChatAction> {
        if self.lifecycle != Lifecycle::Open {
            return vec![];
        }

        let file_id = self.store.get(id).and_then(|m| m.attachment_id.clone());
        vec![ChatAction::Delete { request: DeleteRequest { timestamp: id.to_string(), file_id } }]
    }

    /// Toggle and persist the mute flag.
    pub fn toggle_mute(&mut self) -> Vec<ChatAction> {
        if self.lifecycle != Lifecycle::Open {
            return vec![];
        }
        let muted = self.gate.toggle_mute();
        tracing::info!(muted, "mute toggled");
        vec![ChatAction::Render]
    }

    /// Commit mention candidate `index` into the compose buffer.
    ///
    /// Does nothing unless the popup is open and `index` is in range.
    pub fn pick_mention(&mut self, index: usize) -> Vec<ChatAction> {
        let in_range = self.mentions.query().is_some_and(|q| index < q.candidates.len());
        if self.lifecycle != Lifecycle::Open || !in_range {
            return vec![];
        }

        self.mentions.select(index);
        match self.mentions.commit(self.compose.text()) {
            Some(text) => {
                self.compose.set(text);
                vec![ChatAction::Render]
            },
            None => vec![],
        }
    }

    /// Read-only snapshot for rendering.
    pub fn view(&self) -> ChatView<'_> {
        ChatView {
            messages: &self.store,
            connection: self.connection.state(),
            history_loaded: self.history.cold_loaded(),
            compose: self.compose.text(),
            mention: self.mentions.query(),
            muted: self.gate.is_muted(),
            roster: self.mapper.roster(),
            username: &self.username,
        }
    }

    /// Message store.
    pub fn messages(&self) -> &MessageStore {
        &self.store
    }

    /// Socket state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Compose buffer.
    pub fn compose(&self) -> &ComposeBuffer {
        &self.compose
    }

    /// Mention suggester state.
    pub fn mentions(&self) -> &MentionSuggester {
        &self.mentions
    }

    /// True between `open` and `close`.
    pub fn is_open(&self) -> bool {
        self.lifecycle == Lifecycle::Open
    }

    /// True after `close`.
    pub fn is_closed(&self) -> bool {
        self.lifecycle == Lifecycle::Closed
    }

    /// Mute flag.
    pub fn is_muted(&self) -> bool {
        self.gate.is_muted()
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<ChatAction> {
        match key {
            KeyInput::Enter if self.mentions.is_open() => {
                if let Some(text) = self.mentions.commit(self.compose.text()) {
                    self.compose.set(text);
                }
                vec![ChatAction::Render]
            },
            KeyInput::Enter => self.send_text(),
            KeyInput::Esc if self.mentions.is_open() => {
                self.mentions.dismiss();
                vec![ChatAction::Render]
            },
            KeyInput::Up if self.mentions.is_open() => {
                self.mentions.select_previous();
                vec![ChatAction::Render]
            },
            KeyInput::Down if self.mentions.is_open() => {
                self.mentions.select_next();
                vec![ChatAction::Render]
            },
            KeyInput::Esc | KeyInput::Up | KeyInput::Down => vec![],
            KeyInput::Char(c) => self.edit(|buf| buf.insert(c)),
            KeyInput::Backspace => self.edit(ComposeBuffer::backspace),
            KeyInput::Delete => self.edit(ComposeBuffer::delete),
            KeyInput::Left => self.edit(ComposeBuffer::move_left),
            KeyInput::Right => self.edit(ComposeBuffer::move_right),
            KeyInput::Home => self.edit(ComposeBuffer::home),
            KeyInput::End => self.edit(ComposeBuffer::end),
        }
    }

    fn edit(&mut self, f: impl FnOnce(&mut ComposeBuffer)) -> Vec<ChatAction> {
        f(&mut self.compose);
        self.refresh_mentions();
        vec![ChatAction::Render]
    }

    fn refresh_mentions(&mut self) {
        self.mentions.update(self.compose.text(), self.mapper.roster());
    }

    fn handle_history(
        &mut self,
        mode: SyncMode,
        result: Result<Vec<deskchat_proto::RawMessage>, String>,
    ) -> Vec<ChatAction> {
        let was_loaded = self.history.cold_loaded();

        match result {
            Ok(records) => {
                let messages = records.into_iter().map(|raw| self.mapper.map(raw)).collect();
                self.history.apply(mode, messages, &mut self.store);
            },
            Err(e) => self.history.fail(mode, &e),
        }

        let mut actions = Vec::new();
        if !was_loaded && self.history.cold_loaded() {
            actions.extend(Self::connection_actions(self.connection.open()));
        }
        actions.push(ChatAction::Render);
        actions
    }

    fn handle_frame(&mut self, text: &str) -> Vec<ChatAction> {
        let frame = match ServerFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Ignoring malformed frame: {:?}", e);
                return vec![];
            },
        };

        match frame {
            ServerFrame::NewMessage(raw) => {
                let message = self.mapper.map(raw);
                let id = message.id.clone();
                let sender = message.sender.clone();
                match self.store.insert_live(message) {
                    LiveInsert::Duplicate => {
                        tracing::debug!(%id, %sender, "dropping duplicate message");
                        vec![]
                    },
                    LiveInsert::Inserted | LiveInsert::Replaced => {
                        let cue = self.gate.on_arrival(&sender);
                        tracing::debug!(%id, %sender, ?cue, "message arrived");
                        vec![ChatAction::Render]
                    },
                }
            },
            ServerFrame::DeleteMessage(payload) => {
                if self.store.remove(&payload.timestamp).is_some() {
                    vec![ChatAction::Render]
                } else {
                    tracing::debug!(id = %payload.timestamp, "delete for unknown message");
                    vec![]
                }
            },
        }
    }

    fn handle_send_finished(&mut self, send_id: SendId, result: Result<(), String>) -> Vec<ChatAction> {
        let Some(draft) = self.pending_sends.remove(&send_id) else {
            tracing::debug!(%send_id, "completion for unknown send");
            return vec![];
        };

        match result {
            Ok(()) => vec![],
            Err(message) => {
                tracing::warn!(%send_id, "send failed: {}", message);
                let mut actions = vec![ChatAction::Alert { message }];
                if let Some(draft) = draft {
                    self.compose.set(draft);
                    self.refresh_mentions();
                    actions.push(ChatAction::Render);
                }
                actions
            },
        }
    }

    fn track_send(&mut self, draft: Option<String>) -> SendId {
        let send_id = SendId(self.next_send);
        self.next_send += 1;
        self.pending_sends.insert(send_id, draft);
        send_id
    }

    fn with_render(mut actions: Vec<ChatAction>) -> Vec<ChatAction> {
        actions.push(ChatAction::Render);
        actions
    }

    fn connection_actions(actions: Vec<ConnectionAction>) -> Vec<ChatAction> {
        actions
            .into_iter()
            .map(|action| match action {
                ConnectionAction::OpenSocket { socket } => ChatAction::OpenSocket { socket },
                ConnectionAction::DetachSocket { socket } => ChatAction::DetachSocket { socket },
                ConnectionAction::CloseSocket { socket, code } => {
                    ChatAction::CloseSocket { socket, code }
                },
                ConnectionAction::ScheduleReconnect { delay } => {
                    ChatAction::ScheduleReconnect { delay }
                },
                ConnectionAction::CancelReconnect => ChatAction::CancelReconnect,
                ConnectionAction::Resync => ChatAction::FetchHistory { mode: SyncMode::Resync },
            })
            .collect()
    }
}
