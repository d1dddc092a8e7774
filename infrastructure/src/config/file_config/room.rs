//! Room pacing configuration from TOML (`[room]` section)

use colloquy_application::RoomConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw room configuration; durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoomConfig {
    pub turn_delay_ms: u64,
    pub interrupted_turn_delay_ms: u64,
    pub error_backoff_ms: u64,
    pub inject_timeout_ms: u64,
    /// Broadcast messages held before the turn loop waits on the reader.
    pub broadcast_buffer: usize,
}

impl Default for FileRoomConfig {
    fn default() -> Self {
        let defaults = RoomConfig::default();
        Self {
            turn_delay_ms: defaults.turn_delay.as_millis() as u64,
            interrupted_turn_delay_ms: defaults.interrupted_turn_delay.as_millis() as u64,
            error_backoff_ms: defaults.error_backoff.as_millis() as u64,
            inject_timeout_ms: defaults.inject_timeout.as_millis() as u64,
            broadcast_buffer: defaults.broadcast_buffer,
        }
    }
}

impl FileRoomConfig {
    pub fn to_room_config(&self) -> RoomConfig {
        RoomConfig::default()
            .with_turn_delay(Duration::from_millis(self.turn_delay_ms))
            .with_interrupted_turn_delay(Duration::from_millis(self.interrupted_turn_delay_ms))
            .with_error_backoff(Duration::from_millis(self.error_backoff_ms))
            .with_inject_timeout(Duration::from_millis(self.inject_timeout_ms))
            .with_broadcast_buffer(self.broadcast_buffer)
    }
}
