//! Prompt domain
//!
//! Seed, judge and other fixed text used by the conversation room.

mod template;

pub use template::{ConversationText, PromptTemplate};
