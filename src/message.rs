//! Line protocol definitions
//!
//! Every server → client message is rendered to text through `Display`,
//! and `encode` adds the wire framing. Client → server traffic is plain
//! newline-delimited text decoded by `ChatLineCodec`.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::types::DisplayName;

/// Greeting line sent right after a connection is admitted
pub const WELCOME_BANNER: &str = "Welcome to TCP-Chat!";

/// Name prompt, sent without a trailing newline
pub const NAME_PROMPT: &str = "[ENTER YOUR NAME]: ";

/// Fixed-width UTC timestamp layout used in chat lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Welcome banner followed by the name prompt
    Welcome,
    /// Blank name was submitted, connection is about to close
    InvalidName,
    /// A client finished naming
    Joined { name: DisplayName },
    /// A joined client disconnected
    Left { name: DisplayName },
    /// A formatted chat line, live or replayed from history
    Chat(String),
}

impl ServerMessage {
    /// Render the message exactly as it goes on the wire
    pub fn encode(&self) -> String {
        match self {
            // the prompt stays open so the name is typed on the same line
            ServerMessage::Welcome => self.to_string(),
            _ => format!("{}\n", self),
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome => write!(f, "{}\n{}", WELCOME_BANNER, NAME_PROMPT),
            ServerMessage::InvalidName => f.write_str("Invalid name. Connection closed."),
            ServerMessage::Joined { name } => write!(f, "{} has joined the chat", name),
            ServerMessage::Left { name } => write!(f, "{} has left the chat", name),
            ServerMessage::Chat(line) => f.write_str(line),
        }
    }
}

/// Format a chat line as `[<timestamp>][<name>]: <text>`
pub fn format_chat_line(at: DateTime<Utc>, name: &DisplayName, text: &str) -> String {
    format!("[{}][{}]: {}", at.format(TIMESTAMP_FORMAT), name, text)
}

/// Extract the chat text from a received line
///
/// Returns None for lines that are blank after trimming; those are
/// dropped without any side effect.
pub fn chat_text(raw: &str) -> Option<&str> {
    let text = raw.trim();
    (!text.is_empty()).then_some(text)
}
