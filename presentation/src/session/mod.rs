//! Interactive spectator session
//!
//! Runs a room for one stored conversation: renders the broadcast to the
//! terminal, turns typed lines into interventions or commands, and saves
//! the conversation when the session ends.

mod command;
mod debate;

pub use command::SessionCommand;
pub use debate::{DebateSession, SessionEnd, SessionError, SessionOutcome, spawn_stdin_lines};
