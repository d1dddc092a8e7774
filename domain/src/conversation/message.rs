//! Conversation message value objects.
//!
//! A [`Message`] is both the unit broadcast to spectators and the persisted
//! form of a completed turn. Its [`MessageKind`] tells the two apart.

use crate::prompt::ConversationText;
use serde::{Deserialize, Serialize};

/// Sender used for human messages injected from outside the room.
pub const USER_SENDER: &str = "User";

/// Sender used for out-of-band status notices.
pub const SYSTEM_SENDER: &str = "System";

/// Semantic type of a [`Message`].
///
/// `Start` and `End` bracket one turn; `Chunk` carries an incremental
/// fragment of the turn in progress. `Full` is the canonical record of a
/// completed turn (content already formatted as `"<sender>: <text>"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Start,
    Chunk,
    End,
    System,
    Full,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Start => "start",
            MessageKind::Chunk => "chunk",
            MessageKind::End => "end",
            MessageKind::System => "system",
            MessageKind::Full => "full",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single conversation event (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl Message {
    pub fn new(sender: impl Into<String>, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            kind,
        }
    }

    /// Opens a turn for `sender`.
    pub fn start(sender: impl Into<String>) -> Self {
        Self::new(sender, String::new(), MessageKind::Start)
    }

    /// Closes a turn for `sender`.
    pub fn end(sender: impl Into<String>) -> Self {
        Self::new(sender, String::new(), MessageKind::End)
    }

    /// Closes a turn that could not be started, carrying the error inline.
    pub fn end_with_error(sender: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::new(sender, format!("[Error: {}]", error), MessageKind::End)
    }

    /// An incremental fragment; carries only the new text, never the cumulative turn.
    pub fn chunk(sender: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::new(sender, fragment, MessageKind::Chunk)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(SYSTEM_SENDER, content, MessageKind::System)
    }

    /// A message typed by the human, as handed to the room's injector.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(USER_SENDER, content, MessageKind::Full)
    }

    /// The canonical record of a completed turn: `"<sender>: <text>"`.
    pub fn turn(sender: impl Into<String>, text: &str) -> Self {
        let sender = sender.into();
        let content = format!("{}: {}", sender, text);
        Self::new(sender, content, MessageKind::Full)
    }

    /// Record of a turn that was cut short by an intervention.
    pub fn interrupted_turn(sender: impl Into<String>, partial: &str) -> Self {
        let text = format!("{}{}", partial, ConversationText::INTERRUPTED_MARKER);
        Self::turn(sender, &text)
    }

    /// History record of a human intervention, attributed to the injector's sender.
    pub fn intervention(injected: &Message) -> Self {
        Self::new(
            injected.sender.clone(),
            format!("{}{}", ConversationText::INTERVENTION_PREFIX, injected.content),
            MessageKind::Full,
        )
    }

    pub fn is_full(&self) -> bool {
        self.kind == MessageKind::Full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_lowercase_under_type() {
        let msg = Message::start("A");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "start");
        assert_eq!(json["sender"], "A");
        assert_eq!(json["content"], "");
    }

    #[test]
    fn test_deserialize_without_content() {
        let msg: Message = serde_json::from_str(r#"{"sender":"B","type":"end"}"#).unwrap();
        assert_eq!(msg, Message::end("B"));
    }

    #[test]
    fn test_turn_formats_sender_prefix() {
        let msg = Message::turn("A", "hello there");
        assert_eq!(msg.sender, "A");
        assert_eq!(msg.content, "A: hello there");
        assert!(msg.is_full());
    }

    #[test]
    fn test_interrupted_turn_carries_marker() {
        let msg = Message::interrupted_turn("A", "I was say");
        assert_eq!(msg.content, "A: I was say [Interrupted]");
    }

    #[test]
    fn test_intervention_keeps_sender() {
        let injected = Message::user("wait");
        let record = Message::intervention(&injected);
        assert_eq!(record.sender, "User");
        assert_eq!(record.content, "User (Intervention): wait");
        assert_eq!(record.kind, MessageKind::Full);
    }

    #[test]
    fn test_end_with_error_brackets_text() {
        let msg = Message::end_with_error("A", "connection refused");
        assert_eq!(msg.kind, MessageKind::End);
        assert_eq!(msg.content, "[Error: connection refused]");
    }
}
