//! Domain layer for colloquy
//!
//! This crate contains the conversation entities and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Message**: a broadcast event (`start`, `chunk`, `end`, `system`) or the
//!   persisted record of a completed turn (`full`)
//! - **History**: the ordered turn records that form every agent's context
//! - **Conversation**: a topic, its agent roster and history, stored between sessions

pub mod agent;
pub mod conversation;
pub mod core;
pub mod prompt;

// Re-export commonly used types
pub use agent::AgentProfile;
pub use conversation::{
    entities::{Conversation, ConversationStatus},
    history::History,
    message::{Message, MessageKind, SYSTEM_SENDER, USER_SENDER},
};
pub use core::error::DomainError;
pub use prompt::{ConversationText, PromptTemplate};

/// Validates that agent names are present and unique.
pub fn validate_roster(agents: &[AgentProfile]) -> Result<(), DomainError> {
    if agents.is_empty() {
        return Err(DomainError::NoAgents);
    }
    let mut seen = std::collections::HashSet::new();
    for agent in agents {
        if agent.name.trim().is_empty() {
            return Err(DomainError::InvalidAgent("agent name is empty".to_string()));
        }
        if !seen.insert(agent.name.as_str()) {
            return Err(DomainError::DuplicateAgent(agent.name.clone()));
        }
    }
    Ok(())
}
