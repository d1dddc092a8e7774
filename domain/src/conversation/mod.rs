//! Conversation domain.
//!
//! - [`message::Message`]: broadcast event and persisted turn record
//! - [`history::History`]: ordered record of completed turns
//! - [`entities::Conversation`]: the stored aggregate resumed across sessions

pub mod entities;
pub mod history;
pub mod message;
