//! Conversation aggregate as persisted between sessions.

use super::history::History;
use crate::agent::AgentProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a stored conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    #[default]
    Active,
    /// A judge verdict has been appended; the debate is over.
    Concluded,
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationStatus::Active => write!(f, "active"),
            ConversationStatus::Concluded => write!(f, "concluded"),
        }
    }
}

/// A stored conversation (Entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub topic: String,
    #[serde(default)]
    pub status: ConversationStatus,
    pub agents: Vec<AgentProfile>,
    #[serde(default)]
    pub history: History,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(topic: impl Into<String>, agents: Vec<AgentProfile>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.into(),
            status: ConversationStatus::Active,
            agents,
            history: History::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Topic to seed the room with: empty when resuming an existing history.
    pub fn seed_topic(&self) -> &str {
        if self.history.is_empty() {
            &self.topic
        } else {
            ""
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_concluded(&self) -> bool {
        self.status == ConversationStatus::Concluded
    }
}
