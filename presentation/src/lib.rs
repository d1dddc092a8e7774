//! Presentation layer for colloquy
//!
//! This crate contains CLI definitions, the console renderer for the room
//! broadcast, progress indicators, and the interactive spectator session.

pub mod cli;
pub mod config;
pub mod output;
pub mod progress;
pub mod session;

// Re-export commonly used types
pub use cli::commands::{Cli, Command};
pub use config::OutputConfig;
pub use output::console::ConsoleRenderer;
pub use progress::reporter::ThinkingIndicator;
pub use session::{
    DebateSession, SessionCommand, SessionEnd, SessionError, SessionOutcome, spawn_stdin_lines,
};
