//! Line parsing.
//!
//! Turns one line of terminal input into a [`UserInput`]. What a line means
//! depends on whether a mention popup is showing:
//!
//! | Line | Popup closed | Popup open |
//! |---|---|---|
//! | `/image <url>`, `/audio <url>` | send media | send media |
//! | `/delete <id>` | delete message | delete message |
//! | `/mute`, `/quit` | toggle mute, quit | toggle mute, quit |
//! | `1`..`5` | text | pick candidate |
//! | `up`, `down` | text | move selection |
//! | empty | send the draft | dismiss popup |
//! | anything else | text | text |

use deskchat_app::KeyInput;
use deskchat_client::UserInput;
use deskchat_core::MAX_CANDIDATES;
use deskchat_proto::MessageKind;
use thiserror::Error;

/// A line that looked like a command but was not usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Command needs an argument.
    #[error("usage: /{0} <{1}>")]
    MissingArgument(&'static str, &'static str),

    /// Unrecognized `/command`.
    #[error("unknown command: /{0} (try /image, /audio, /delete, /mute, /quit)")]
    Unknown(String),
}

/// Interpret `line`.
pub fn parse_line(line: &str, popup_open: bool) -> Result<UserInput, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(command) = line.strip_prefix('/') {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        return parse_command(name, arg);
    }

    if popup_open {
        match line.trim() {
            "" => return Ok(UserInput::Key(KeyInput::Esc)),
            "up" => return Ok(UserInput::Key(KeyInput::Up)),
            "down" => return Ok(UserInput::Key(KeyInput::Down)),
            pick => {
                if let Ok(n) = pick.parse::<usize>()
                    && (1..=MAX_CANDIDATES).contains(&n)
                {
                    return Ok(UserInput::PickMention(n - 1));
                }
            },
        }
    }

    Ok(UserInput::Line(line.to_string()))
}

fn parse_command(name: &str, arg: &str) -> Result<UserInput, CommandError> {
    let media = |command: &'static str, kind: MessageKind| {
        require(arg, command, "url").map(|content| UserInput::SendMedia { kind, content, mime_type: None })
    };

    match name {
        "image" => media("image", MessageKind::Image),
        "audio" => media("audio", MessageKind::Audio),
        "delete" => require(arg, "delete", "id").map(UserInput::Delete),
        "mute" => Ok(UserInput::ToggleMute),
        "quit" | "exit" => Ok(UserInput::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn require(arg: &str, command: &'static str, argument: &'static str) -> Result<String, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument(command, argument));
    }
    Ok(arg.to_string())
}
