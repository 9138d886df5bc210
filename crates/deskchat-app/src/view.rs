//! Rendering abstraction.
//!
//! The [`View`] trait decouples the runtime from a concrete frontend.
//! [`ChatView`] is the read-only view model it receives: the subset of widget
//! state needed to draw, without exposing the state machines themselves.

use deskchat_core::{ConnectionState, MentionQuery, MessageStore, Roster};

/// Read-only snapshot of widget state.
#[derive(Debug, Clone, Copy)]
pub struct ChatView<'a> {
    /// Messages in display order.
    pub messages: &'a MessageStore,
    /// Socket state.
    pub connection: ConnectionState,
    /// True once the cold load settled.
    pub history_loaded: bool,
    /// Compose buffer text.
    pub compose: &'a str,
    /// Open mention popup. `None` if hidden.
    pub mention: Option<&'a MentionQuery>,
    /// Mute flag.
    pub muted: bool,
    /// Known users, for mention highlighting.
    pub roster: &'a Roster,
    /// Current user.
    pub username: &'a str,
}

/// Platform-specific presentation.
///
/// # Implementations
///
/// - **CLI**: line-oriented transcript on stdout
/// - **Tests**: recording views that capture renders and alerts
pub trait View: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Draw the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn render(&mut self, view: &ChatView<'_>) -> Result<(), Self::Error>;

    /// Show a blocking alert.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn alert(&mut self, message: &str) -> Result<(), Self::Error>;
}
