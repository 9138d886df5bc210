//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples the widget from any particular terminal or GUI toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key (send, or commit the selected mention).
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Escape key (dismiss the mention popup).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key (previous mention candidate).
    Up,
    /// Down arrow key (next mention candidate).
    Down,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
}
