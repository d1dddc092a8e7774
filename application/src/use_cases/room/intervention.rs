//! Intervention channel
//!
//! A single-slot handoff from an external injector to the room. Injection
//! waits only briefly and never reports failure as an error: a message the
//! room cannot take is logged and dropped.

use colloquy_domain::Message;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Cloneable handle for injecting human messages into a room.
#[derive(Clone)]
pub struct Injector {
    sender: mpsc::Sender<Message>,
    stop: CancellationToken,
    timeout: Duration,
}

impl Injector {
    pub(super) fn new(sender: mpsc::Sender<Message>, stop: CancellationToken, timeout: Duration) -> Self {
        Self {
            sender,
            stop,
            timeout,
        }
    }

    /// Hand a message to the room, waiting at most the configured timeout.
    ///
    /// Returns whether the room took the message. While the slot already
    /// holds an unconsumed message this waits for it to clear; a message
    /// handed over before the loop starts is admitted ahead of the first turn.
    pub async fn inject(&self, message: Message) -> bool {
        if self.stop.is_cancelled() {
            warn!("InjectMessage dropped: room stopped");
            return false;
        }

        match tokio::time::timeout(self.timeout, self.sender.send(message)).await {
            Ok(Ok(())) => {
                debug!("Intervention handed to room");
                true
            }
            Ok(Err(_)) => {
                warn!("InjectMessage dropped: room closed");
                false
            }
            Err(_) => {
                warn!("InjectMessage timed out (room busy or stopped)");
                false
            }
        }
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("timeout", &self.timeout)
            .field("stopped", &self.stop.is_cancelled())
            .finish()
    }
}
