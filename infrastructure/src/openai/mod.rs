//! OpenAI-compatible chat completions adapter
//!
//! Streams `POST <base_url>/chat/completions` responses as Server-Sent
//! Events and forwards the content deltas through a [`StreamHandle`].
//!
//! [`StreamHandle`]: colloquy_application::StreamHandle

pub mod gateway;
pub mod protocol;
pub mod sse;

pub use gateway::{DEFAULT_BASE_URL, OpenAiCompatibleGateway};
