//! Turn scheduler
//!
//! Round-robins the agents one turn at a time until the room's stop signal
//! fires. Owns the history for the whole of its lifetime and hands it back
//! when it exits.

use crate::agent::Agent;
use crate::config::RoomConfig;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use colloquy_domain::{ConversationText, History, Message, PromptTemplate};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The room stopped, or its spectator went away; the scheduler must exit.
#[derive(Debug)]
pub(super) struct Halted;

/// How a turn that produced a stream came to an end.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum TurnOutcome {
    /// The stream closed; carries the accumulated text.
    Completed(String),
    /// An intervention cut the turn short; history and broadcast are already updated.
    Interrupted,
}

pub(super) struct TurnScheduler {
    pub(super) agents: Arc<Vec<Agent>>,
    pub(super) history: History,
    pub(super) config: RoomConfig,
    pub(super) broadcast: mpsc::Sender<Message>,
    pub(super) interventions: mpsc::Receiver<Message>,
    pub(super) stop: CancellationToken,
    pub(super) logger: Arc<dyn ConversationLogger>,
    pub(super) snapshots: watch::Sender<History>,
}

/// Index of the agent who speaks first.
///
/// The agent after the last history sender goes next; when nobody in the
/// roster matches (fresh room, verdict, intervention), the first agent starts.
pub(super) fn first_speaker(names: &[&str], last_sender: Option<&str>) -> usize {
    last_sender
        .and_then(|last| names.iter().position(|name| *name == last))
        .map(|i| (i + 1) % names.len())
        .unwrap_or(0)
}

impl TurnScheduler {
    pub(super) async fn run(mut self, topic: String) -> History {
        if self.agents.is_empty() {
            return self.history;
        }

        let seed = (!topic.is_empty()).then(|| PromptTemplate::seed_line(&topic));
        info!("Room loop started (topic: {:?})", topic);

        let names: Vec<&str> = self.agents.iter().map(Agent::name).collect();
        let mut index = first_speaker(&names, self.history.last_sender());
        if !self.history.is_empty() {
            info!(
                "Resuming conversation. Last speaker: {}. Next speaker: {}",
                self.history.last_sender().unwrap_or_default(),
                names[index]
            );
        }

        while self.take_turn(index, seed.as_deref()).await.is_ok() {
            index = (index + 1) % self.agents.len();
        }

        info!("Room loop stopped after {} history entries", self.history.len());
        self.history
    }

    async fn take_turn(&mut self, index: usize, seed: Option<&str>) -> Result<(), Halted> {
        if self.stop.is_cancelled() {
            return Err(Halted);
        }

        self.admit_pending_intervention().await?;

        let agent = self.agents[index].clone();
        let name = agent.name();
        info!("Agent {} is thinking...", name);

        let context = self.context(seed);
        self.emit(Message::start(name)).await?;

        let turn = self.stop.child_token();
        let stream = tokio::select! {
            biased;
            _ = self.stop.cancelled() => return Err(Halted),
            stream = agent.speak(&context, turn.clone()) => stream,
        };

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Agent {} could not start a turn: {}", name, e);
                self.logger.log(ConversationEvent::new(
                    "turn_failed",
                    serde_json::json!({ "sender": name, "error": e.to_string() }),
                ));
                self.emit(Message::end_with_error(name, &e)).await?;
                return self.pause(self.config.error_backoff).await;
            }
        };

        match self.consume_stream(name, stream, turn).await? {
            TurnOutcome::Completed(text) => {
                info!("Agent {} finished speaking. Length: {}", name, text.len());
                self.emit(Message::end(name)).await?;
                self.record(Message::turn(name, &text), "turn_completed");
                self.pause(self.config.turn_delay).await
            }
            TurnOutcome::Interrupted => self.pause(self.config.interrupted_turn_delay).await,
        }
    }

    /// Lets a waiting human message cut in line before the next agent speaks.
    async fn admit_pending_intervention(&mut self) -> Result<(), Halted> {
        let Ok(injected) = self.interventions.try_recv() else {
            return Ok(());
        };
        info!("User injected message: {}", injected.content);

        let record = Message::intervention(&injected);
        self.emit(record.clone()).await?;
        self.record(record, "intervention");
        self.emit(Message::system(ConversationText::INTERVENED_NOTICE))
            .await
    }

    /// Seed line (if any) followed by every history entry, untruncated.
    fn context(&self, seed: Option<&str>) -> Vec<String> {
        seed.map(str::to_string)
            .into_iter()
            .chain(self.history.contents())
            .collect()
    }

    /// Broadcast one message, blocking on a slow reader until stopped.
    pub(super) async fn emit(&self, message: Message) -> Result<(), Halted> {
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => Err(Halted),
            sent = self.broadcast.send(message) => sent.map_err(|_| {
                debug!("Broadcast reader dropped; stopping room");
                self.stop.cancel();
                Halted
            }),
        }
    }

    pub(super) fn record(&mut self, message: Message, event_type: &'static str) {
        self.logger.log(ConversationEvent::new(
            event_type,
            serde_json::json!({ "sender": message.sender, "content": message.content }),
        ));
        self.history.push(message);
        self.snapshots.send_replace(self.history.clone());
    }

    async fn pause(&self, delay: Duration) -> Result<(), Halted> {
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => Err(Halted),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
