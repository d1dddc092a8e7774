//! Stream consumer
//!
//! Drives one agent's fragment stream until it closes or a human
//! intervention cuts it short, staying responsive to the stop signal.

use super::scheduler::{Halted, TurnOutcome, TurnScheduler};
use crate::ports::llm_gateway::StreamHandle;
use colloquy_domain::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

impl TurnScheduler {
    pub(super) async fn consume_stream(
        &mut self,
        speaker: &str,
        mut stream: StreamHandle,
        turn: CancellationToken,
    ) -> Result<TurnOutcome, Halted> {
        let mut accumulated = String::new();

        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => return Err(Halted),
                Some(injected) = self.interventions.recv() => {
                    self.interrupt(speaker, &accumulated, injected, stream, turn).await?;
                    return Ok(TurnOutcome::Interrupted);
                }
                fragment = stream.next_fragment() => match fragment {
                    Some(fragment) => {
                        accumulated.push_str(&fragment);
                        self.emit(Message::chunk(speaker, fragment)).await?;
                    }
                    None => return Ok(TurnOutcome::Completed(accumulated)),
                },
            }
        }
    }

    /// Abandons the current turn in favour of the injected message.
    ///
    /// The spectator sees the injection immediately; the abandoned stream
    /// is cancelled and drained in the background; history gains the
    /// partial turn and then the intervention; the turn is closed with `end`.
    async fn interrupt(
        &mut self,
        speaker: &str,
        partial: &str,
        injected: Message,
        stream: StreamHandle,
        turn: CancellationToken,
    ) -> Result<(), Halted> {
        info!("User interrupted {}: {}", speaker, injected.content);

        self.emit(injected.clone()).await?;

        turn.cancel();
        stream.drain();
        debug!("Draining abandoned stream of {}", speaker);

        self.record(Message::interrupted_turn(speaker, partial), "turn_interrupted");
        self.record(Message::intervention(&injected), "intervention");

        self.emit(Message::end(speaker)).await
    }
}
