//! Conversation repository port
//!
//! Long-term storage of conversations lives outside the room. The session
//! layer hydrates a room's history from here and hands it back at the end.

use async_trait::async_trait;
use colloquy_domain::Conversation;
use thiserror::Error;

/// Errors from conversation storage
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Storage for conversations
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Insert a new conversation or replace the stored one with the same id.
    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError>;

    async fn get(&self, id: &str) -> Result<Conversation, RepositoryError>;

    /// All stored conversations, most recently created first.
    async fn list(&self) -> Result<Vec<Conversation>, RepositoryError>;

    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}
