//! Ordered, append-only record of completed turns.

use super::message::Message;
use serde::{Deserialize, Serialize};

/// Conversation history (Entity)
///
/// Insertion order is significant: the entries' contents, in order, are the
/// context window supplied to every agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }

    /// Sender of the most recent entry, used to resume turn order.
    pub fn last_sender(&self) -> Option<&str> {
        self.entries.last().map(|m| m.sender.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    /// Entry contents in order, as handed to an agent.
    pub fn contents(&self) -> Vec<String> {
        self.entries.iter().map(|m| m.content.clone()).collect()
    }

    pub fn into_inner(self) -> Vec<Message> {
        self.entries
    }
}

impl From<Vec<Message>> for History {
    fn from(entries: Vec<Message>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
