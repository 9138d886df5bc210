//! Line-oriented terminal view.
//!
//! A terminal transcript cannot be redrawn, so [`TerminalView`] prints only
//! what changed since the previous render: new or edited messages, removed
//! messages, connection transitions, the mention popup and the mute flag.

use std::{
    collections::BTreeMap,
    io::{self, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use deskchat_app::{ChatView, View};
use deskchat_core::{
    ConnectionState, Message, MessageId, NotificationError, NotificationSink, Roster, Segment,
    highlight_mentions,
};
use deskchat_proto::MessageKind;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Prints widget state changes to a writer.
#[derive(Debug)]
pub struct TerminalView<W> {
    out: W,
    popup_open: Arc<AtomicBool>,
    /// Last printed version of each message.
    shown: BTreeMap<MessageId, Message>,
    connection: Option<ConnectionState>,
    history_loaded: bool,
    popup: Option<(Vec<String>, usize)>,
    muted: Option<bool>,
}

impl<W: Write + Send> TerminalView<W> {
    /// View writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            popup_open: Arc::new(AtomicBool::new(false)),
            shown: BTreeMap::new(),
            connection: None,
            history_loaded: false,
            popup: None,
            muted: None,
        }
    }

    /// Flag tracking whether the mention popup is showing, for the input
    /// reader.
    pub fn popup_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.popup_open)
    }

    /// Underlying writer.
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn print_message(&mut self, message: &Message, roster: &Roster) -> io::Result<()> {
        write!(self.out, "[{}] {}: ", message.id, message.display_name)?;
        match message.kind {
            MessageKind::Text => {
                for segment in highlight_mentions(&message.content, roster) {
                    match segment {
                        Segment::Text(text) => write!(self.out, "{text}")?,
                        Segment::Mention(name) => write!(self.out, "{BOLD}{name}{RESET}")?,
                    }
                }
                writeln!(self.out)
            },
            MessageKind::Image | MessageKind::Audio => {
                writeln!(self.out, "[{}] {}", message.kind.as_str(), message.content)
            },
        }
    }
}

impl<W: Write + Send> View for TerminalView<W> {
    type Error = io::Error;

    fn render(&mut self, view: &ChatView<'_>) -> io::Result<()> {
        if self.connection != Some(view.connection) {
            self.connection = Some(view.connection);
            let label = match view.connection {
                ConnectionState::Disconnected => "disconnected",
                ConnectionState::Connecting => "connecting...",
                ConnectionState::Connected => "connected",
            };
            writeln!(self.out, "-- {label}")?;
        }

        if view.history_loaded && !self.history_loaded {
            self.history_loaded = true;
            writeln!(self.out, "-- {} messages loaded", view.messages.len())?;
        }

        let removed: Vec<MessageId> =
            self.shown.keys().filter(|id| !view.messages.contains(id)).cloned().collect();
        for id in removed {
            self.shown.remove(&id);
            writeln!(self.out, "-- message {id} deleted")?;
        }

        for message in view.messages.iter() {
            match self.shown.get(&message.id) {
                Some(seen) if seen == message => continue,
                Some(_) => write!(self.out, "-- edited ")?,
                None => {},
            }
            self.print_message(message, view.roster)?;
            self.shown.insert(message.id.clone(), message.clone());
        }

        if self.muted != Some(view.muted) {
            if self.muted.is_some() {
                writeln!(self.out, "-- sound {}", if view.muted { "muted" } else { "on" })?;
            }
            self.muted = Some(view.muted);
        }

        let popup = view.mention.map(|q| {
            (q.candidates.iter().map(|e| e.username.clone()).collect::<Vec<_>>(), q.selected_index)
        });
        if popup != self.popup {
            if let Some((names, selected)) = &popup {
                writeln!(self.out, "-- mention @{}:", view.mention.map_or("", |q| q.prefix.as_str()))?;
                for (i, name) in names.iter().enumerate() {
                    let marker = if i == *selected { '>' } else { ' ' };
                    writeln!(self.out, "{marker} {}. {name}", i + 1)?;
                }
                writeln!(self.out, "   (number to pick, up/down, empty line to dismiss)")?;
            }
            self.popup = popup;
        }
        self.popup_open.store(self.popup.is_some(), Ordering::SeqCst);

        self.out.flush()
    }

    fn alert(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "!! {message}")?;
        self.out.flush()
    }
}

/// Arrival cue: the terminal bell on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl NotificationSink for TerminalBell {
    fn play(&self) -> Result<(), NotificationError> {
        let mut err = io::stderr();
        err.write_all(b"\x07")
            .and_then(|()| err.flush())
            .map_err(|e| NotificationError::Blocked(e.to_string()))
    }
}
