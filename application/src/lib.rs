//! Application layer for colloquy
//!
//! This crate contains the conversation room, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod agent;
pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use agent::Agent;
pub use config::RoomConfig;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    conversation_repository::{ConversationRepository, RepositoryError},
    llm_gateway::{GatewayError, LlmGateway, StreamHandle},
};
pub use use_cases::room::{Injector, Room, RoomError};
