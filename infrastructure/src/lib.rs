//! Infrastructure layer for colloquy
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod openai;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileOutputConfig, FileProviderConfig,
    FileRoomConfig, FileStorageConfig,
};
pub use logging::JsonlConversationLogger;
pub use openai::OpenAiCompatibleGateway;
pub use storage::JsonFileConversationStore;
