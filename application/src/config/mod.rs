//! Application-level configuration.
//!
//! - [`RoomConfig`]: turn loop pacing and broadcast buffering

pub mod room_config;

pub use room_config::RoomConfig;
