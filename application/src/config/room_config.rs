//! Room pacing and buffering parameters.
//!
//! [`RoomConfig`] groups the static parameters that shape the turn loop's
//! cadence. These are application-layer concerns, not domain policy.

use std::time::Duration;

/// Turn loop pacing and channel sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Pause after a turn that completed naturally.
    pub turn_delay: Duration,
    /// Pause after a turn that was cut short by an intervention.
    pub interrupted_turn_delay: Duration,
    /// Pause after an agent failed to start its stream.
    pub error_backoff: Duration,
    /// How long an injector may wait for the intervention slot.
    pub inject_timeout: Duration,
    /// Broadcast messages buffered before the scheduler blocks on a slow reader.
    pub broadcast_buffer: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            turn_delay: Duration::from_secs(1),
            interrupted_turn_delay: Duration::from_millis(500),
            error_backoff: Duration::from_secs(2),
            inject_timeout: Duration::from_millis(500),
            broadcast_buffer: 16,
        }
    }
}

impl RoomConfig {
    // ==================== Builder Methods ====================

    pub fn with_turn_delay(mut self, delay: Duration) -> Self {
        self.turn_delay = delay;
        self
    }

    pub fn with_interrupted_turn_delay(mut self, delay: Duration) -> Self {
        self.interrupted_turn_delay = delay;
        self
    }

    pub fn with_error_backoff(mut self, delay: Duration) -> Self {
        self.error_backoff = delay;
        self
    }

    pub fn with_inject_timeout(mut self, timeout: Duration) -> Self {
        self.inject_timeout = timeout;
        self
    }

    pub fn with_broadcast_buffer(mut self, buffer: usize) -> Self {
        self.broadcast_buffer = buffer.max(1);
        self
    }
}
