//! `@username` autocomplete and highlighting.
//!
//! The suggester only looks at the end of the compose buffer: a trailing `@`
//! followed by zero or more word characters (`[A-Za-z0-9_]`) opens the popup.
//! Candidates are roster users whose username contains the fragment,
//! case-insensitively, excluding the current user and capped at
//! [`MAX_CANDIDATES`].

use crate::{Roster, RosterEntry};

/// Most candidates shown at once.
pub const MAX_CANDIDATES: usize = 5;

/// Live autocomplete state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionQuery {
    /// Fragment typed after `@` (may be empty).
    pub prefix: String,
    /// Matching roster entries, in roster order.
    pub candidates: Vec<RosterEntry>,
    /// Zero-based index into `candidates`.
    pub selected_index: usize,
}

impl MentionQuery {
    /// Candidate under the cursor.
    pub fn selected(&self) -> Option<&RosterEntry> {
        self.candidates.get(self.selected_index)
    }
}

/// Drives mention autocomplete from the compose buffer.
///
/// # Invariants
///
/// - A query exists only while it has at least one candidate.
/// - `selected_index < candidates.len()` whenever a query exists.
#[derive(Debug, Clone)]
pub struct MentionSuggester {
    current_user: String,
    query: Option<MentionQuery>,
}

impl MentionSuggester {
    /// Create a suggester that never offers `current_user`.
    pub fn new(current_user: impl Into<String>) -> Self {
        Self { current_user: current_user.into(), query: None }
    }

    /// Active query. `None` when the popup is hidden.
    pub fn query(&self) -> Option<&MentionQuery> {
        self.query.as_ref()
    }

    /// True while candidates are being offered.
    pub fn is_open(&self) -> bool {
        self.query.is_some()
    }

    /// Recompute suggestions for the buffer `text`.
    ///
    /// Selection is reset to the first candidate whenever the candidate set
    /// changes and kept otherwise.
    pub fn update(&mut self, text: &str, roster: &Roster) -> Option<&MentionQuery> {
        let Some(start) = trailing_mention(text) else {
            self.query = None;
            return None;
        };

        let prefix = &text[start + 1..];
        let needle = prefix.to_lowercase();
        let candidates: Vec<RosterEntry> = roster
            .iter()
            .filter(|e| e.username != self.current_user)
            .filter(|e| e.username.to_lowercase().contains(&needle))
            .take(MAX_CANDIDATES)
            .cloned()
            .collect();

        if candidates.is_empty() {
            self.query = None;
            return None;
        }

        let selected_index = match &self.query {
            Some(prev) if prev.candidates == candidates => prev.selected_index,
            _ => 0,
        };

        self.query = Some(MentionQuery { prefix: prefix.to_string(), candidates, selected_index });
        self.query.as_ref()
    }

    /// Move the selection up, wrapping to the last candidate.
    pub fn select_previous(&mut self) {
        if let Some(q) = &mut self.query {
            let len = q.candidates.len();
            q.selected_index = (q.selected_index + len - 1) % len;
        }
    }

    /// Move the selection down, wrapping to the first candidate.
    pub fn select_next(&mut self) {
        if let Some(q) = &mut self.query {
            q.selected_index = (q.selected_index + 1) % q.candidates.len();
        }
    }

    /// Move the selection to `index`. Ignored if out of range.
    pub fn select(&mut self, index: usize) {
        if let Some(q) = &mut self.query
            && index < q.candidates.len()
        {
            q.selected_index = index;
        }
    }

    /// Commit the selected candidate into `text`.
    ///
    /// Replaces the trailing `@fragment` with `@username ` and clears the
    /// query. Returns `None` (and leaves the query alone) if nothing is
    /// selected or `text` no longer ends in a mention.
    pub fn commit(&mut self, text: &str) -> Option<String> {
        let username = self.query.as_ref()?.selected()?.username.clone();
        let start = trailing_mention(text)?;

        self.query = None;
        Some(format!("{}@{username} ", &text[..start]))
    }

    /// Hide the popup without touching the buffer.
    pub fn dismiss(&mut self) {
        self.query = None;
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Byte offset of the `@` that starts a trailing mention fragment.
fn trailing_mention(text: &str) -> Option<usize> {
    let fragment_start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map_or(text.len(), |(idx, _)| idx);

    let at = fragment_start.checked_sub(1)?;
    (text.as_bytes()[at] == b'@').then_some(at)
}

/// Part of a message body, for mention highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Plain text.
    Text(&'a str),
    /// `@username` token naming a known user (includes the `@`).
    Mention(&'a str),
}

/// Split `content` into plain text and `@username` mentions.
///
/// Only tokens naming a user in `roster` count as mentions. Adjacent plain
/// text is merged into one segment.
pub fn highlight_mentions<'a>(content: &'a str, roster: &Roster) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut rest = content.char_indices().peekable();

    while let Some((at, c)) = rest.next() {
        if c != '@' {
            continue;
        }

        let name_start = at + 1;
        let mut name_end = name_start;
        while let Some(&(idx, c)) = rest.peek() {
            if !is_word_char(c) {
                break;
            }
            name_end = idx + c.len_utf8();
            rest.next();
        }

        let name = &content[name_start..name_end];
        if name.is_empty() || roster.find(name).is_none() {
            continue;
        }

        if plain_start < at {
            segments.push(Segment::Text(&content[plain_start..at]));
        }
        segments.push(Segment::Mention(&content[at..name_end]));
        plain_start = name_end;
    }

    if plain_start < content.len() {
        segments.push(Segment::Text(&content[plain_start..]));
    }
    segments
}
