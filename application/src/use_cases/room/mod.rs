//! Conversation room
//!
//! Orchestrates a streaming, turn-based conversation between agents while a
//! spectator reads the broadcast and a human may cut in.
//!
//! # Flow
//!
//! ```text
//! start_loop(topic)
//!      ↓
//! ┌─► stop? ──yes──► exit, hand history back
//! │    ↓ no
//! │  pending intervention? ──yes──► broadcast + record it
//! │    ↓
//! │  start ─► chunk* ─► end      (intervention mid-stream: drain, end early)
//! │    ↓
//! └── pause, next agent
//! ```
//!
//! The scheduler task is the only writer of history and broadcast while it
//! runs. [`Room::judge`] and [`Room::finish`] stop it and wait for it to hand
//! the history back before touching it.

mod consumer;
mod intervention;
mod judge;
mod scheduler;

pub use intervention::Injector;

use crate::agent::Agent;
use crate::config::RoomConfig;
use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::LlmGateway;
use colloquy_domain::{AgentProfile, DomainError, History, Message};
use scheduler::TurnScheduler;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Errors from misusing a room's lifecycle
#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Invalid roster: {0}")]
    InvalidRoster(#[from] DomainError),

    #[error("Room already started")]
    AlreadyStarted,

    #[error("A verdict has already been delivered")]
    AlreadyJudged,

    #[error("Turn scheduler failed: {0}")]
    SchedulerFailed(String),
}

enum RoomState {
    /// Not started; history may still be seeded.
    Idle(History),
    /// The scheduler task owns the history.
    Running(JoinHandle<History>),
    /// The scheduler has exited and handed the history back.
    Finished(History),
}

/// A live conversation session.
pub struct Room {
    agents: Arc<Vec<Agent>>,
    config: RoomConfig,
    logger: Arc<dyn ConversationLogger>,
    broadcast_tx: mpsc::Sender<Message>,
    broadcast_rx: Option<mpsc::Receiver<Message>>,
    intervention_tx: mpsc::Sender<Message>,
    intervention_rx: Option<mpsc::Receiver<Message>>,
    stop: CancellationToken,
    snapshots: watch::Sender<History>,
    judged: bool,
    state: RoomState,
}

impl Room {
    /// Creates a room with default pacing. Agent names must be unique.
    pub fn new(agents: Vec<Agent>) -> Result<Self, RoomError> {
        Self::with_config(agents, RoomConfig::default())
    }

    pub fn with_config(agents: Vec<Agent>, config: RoomConfig) -> Result<Self, RoomError> {
        let profiles: Vec<AgentProfile> = agents.iter().map(|a| a.profile().clone()).collect();
        colloquy_domain::validate_roster(&profiles)?;

        let (broadcast_tx, broadcast_rx) = mpsc::channel(config.broadcast_buffer.max(1));
        let (intervention_tx, intervention_rx) = mpsc::channel(1);

        Ok(Self {
            agents: Arc::new(agents),
            config,
            logger: Arc::new(NoConversationLogger),
            broadcast_tx,
            broadcast_rx: Some(broadcast_rx),
            intervention_tx,
            intervention_rx: Some(intervention_rx),
            stop: CancellationToken::new(),
            snapshots: watch::Sender::new(History::new()),
            judged: false,
            state: RoomState::Idle(History::new()),
        })
    }

    /// Records every history mutation through `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Seeds the history of a resumed session. Only allowed before start.
    pub fn set_history(&mut self, history: History) -> Result<(), RoomError> {
        match &mut self.state {
            RoomState::Idle(current) => {
                self.snapshots.send_replace(history.clone());
                *current = history;
                Ok(())
            }
            _ => Err(RoomError::AlreadyStarted),
        }
    }

    /// History, unless the scheduler currently owns it.
    pub fn history(&self) -> Option<&History> {
        match &self.state {
            RoomState::Idle(history) | RoomState::Finished(history) => Some(history),
            RoomState::Running(_) => None,
        }
    }

    /// Follows the history as it grows, one snapshot per recorded entry.
    ///
    /// Ends once the room and its scheduler are gone.
    pub fn subscribe_history(&self) -> watch::Receiver<History> {
        self.snapshots.subscribe()
    }

    /// The spectator's end of the broadcast. Can be taken once.
    pub fn take_broadcast(&mut self) -> Option<mpsc::Receiver<Message>> {
        self.broadcast_rx.take()
    }

    pub fn injector(&self) -> Injector {
        Injector::new(
            self.intervention_tx.clone(),
            self.stop.clone(),
            self.config.inject_timeout,
        )
    }

    /// Best-effort injection; see [`Injector::inject`].
    pub async fn inject_message(&self, message: Message) -> bool {
        self.injector().inject(message).await
    }

    /// Token shared by every owner allowed to stop the room.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RoomState::Running(_))
    }

    /// Spawns the turn scheduler. An empty topic resumes without re-seeding.
    pub fn start_loop(&mut self, topic: &str) -> Result<(), RoomError> {
        let RoomState::Idle(history) = &mut self.state else {
            return Err(RoomError::AlreadyStarted);
        };
        let Some(interventions) = self.intervention_rx.take() else {
            return Err(RoomError::AlreadyStarted);
        };
        let history = std::mem::take(history);

        info!(
            "Room StartLoop: {} agents, {} history entries",
            self.agents.len(),
            history.len()
        );

        let scheduler = TurnScheduler {
            agents: Arc::clone(&self.agents),
            history,
            config: self.config.clone(),
            broadcast: self.broadcast_tx.clone(),
            interventions,
            stop: self.stop.clone(),
            logger: Arc::clone(&self.logger),
            snapshots: self.snapshots.clone(),
        };
        self.state = RoomState::Running(tokio::spawn(scheduler.run(topic.to_string())));
        Ok(())
    }

    /// Signals the scheduler to exit at its next checkpoint. Idempotent.
    pub fn stop_loop(&self) {
        if !self.stop.is_cancelled() {
            info!("Room StopLoop");
        }
        self.stop.cancel();
    }

    /// Waits for a stopped scheduler to hand the history back.
    ///
    /// Dropping the returned future leaves the room running.
    pub async fn wait_stopped(&mut self) -> Result<(), RoomError> {
        let RoomState::Running(handle) = &mut self.state else {
            return Ok(());
        };
        let joined = handle.await;
        match joined {
            Ok(history) => {
                self.state = RoomState::Finished(history);
                Ok(())
            }
            Err(e) => {
                self.state = RoomState::Finished(History::new());
                Err(RoomError::SchedulerFailed(e.to_string()))
            }
        }
    }

    /// Concludes the conversation with a streamed verdict.
    ///
    /// Halts the scheduler for good, waits for its in-flight turn to wind
    /// down, then streams the verdict as sender "Judge" and appends it.
    /// A room is judged at most once.
    pub async fn judge(&mut self, judge: Arc<dyn LlmGateway>) -> Result<(), RoomError> {
        if self.judged {
            return Err(RoomError::AlreadyJudged);
        }
        self.judged = true;
        info!("Room Judge: Judging conversation...");
        self.stop_loop();
        self.wait_stopped().await?;
        self.intervention_rx = None;

        let (RoomState::Idle(history) | RoomState::Finished(history)) = &mut self.state else {
            return Err(RoomError::SchedulerFailed("scheduler still running".to_string()));
        };
        let mut history = std::mem::take(history);
        judge::deliver_verdict(judge.as_ref(), &mut history, &self.broadcast_tx, self.logger.as_ref())
            .await;
        self.snapshots.send_replace(history.clone());
        self.state = RoomState::Finished(history);
        Ok(())
    }

    /// Stops the room and hands the history back for persistence.
    pub async fn finish(mut self) -> Result<History, RoomError> {
        self.stop_loop();
        self.wait_stopped().await?;
        Ok(match self.state {
            RoomState::Idle(history) | RoomState::Finished(history) => history,
            RoomState::Running(_) => History::new(),
        })
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("agents", &self.agents)
            .field("running", &self.is_running())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::conversation_logger::ConversationEvent;
    use crate::ports::llm_gateway::{GatewayError, StreamHandle};
    use async_trait::async_trait;
    use colloquy_domain::MessageKind;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{Notify, oneshot};
    use tokio::time::Instant;

    const WAIT: Duration = Duration::from_secs(5);

    // ==================== Test Mocks ====================

    /// Streams fixed fragments and closes.
    struct ScriptedGateway {
        fragments: Vec<String>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedGateway {
        fn new(fragments: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn chat_stream(
            &self,
            _system_prompt: &str,
            history: &[String],
            _cancellation: CancellationToken,
        ) -> Result<StreamHandle, GatewayError> {
            self.calls.lock().unwrap().push(history.to_vec());
            let (tx, handle) = StreamHandle::channel(4);
            let fragments = self.fragments.clone();
            tokio::spawn(async move {
                for fragment in fragments {
                    if tx.send(fragment).await.is_err() {
                        return;
                    }
                }
            });
            Ok(handle)
        }
    }

    /// Streams one fragment, then holds the stream open until cancelled.
    struct StallingGateway {
        first: String,
        released: Arc<Notify>,
    }

    #[async_trait]
    impl LlmGateway for StallingGateway {
        async fn chat_stream(
            &self,
            _system_prompt: &str,
            _history: &[String],
            cancellation: CancellationToken,
        ) -> Result<StreamHandle, GatewayError> {
            let (tx, handle) = StreamHandle::channel(1);
            let first = self.first.clone();
            let released = Arc::clone(&self.released);
            tokio::spawn(async move {
                let _ = tx.send(first).await;
                cancellation.cancelled().await;
                released.notify_one();
            });
            Ok(handle)
        }
    }

    /// First call streams "Hello", then, once released, pushes a burst that
    /// never looks at its cancellation token and reports whether every send
    /// landed. Later calls stream nothing.
    struct StubbornGateway {
        calls: AtomicUsize,
        release: Arc<Notify>,
        report: Mutex<Option<oneshot::Sender<bool>>>,
    }

    #[async_trait]
    impl LlmGateway for StubbornGateway {
        async fn chat_stream(
            &self,
            _system_prompt: &str,
            _history: &[String],
            _cancellation: CancellationToken,
        ) -> Result<StreamHandle, GatewayError> {
            let (tx, handle) = StreamHandle::channel(1);
            if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
                return Ok(handle);
            }
            let release = Arc::clone(&self.release);
            let report = self.report.lock().unwrap().take();
            tokio::spawn(async move {
                let mut delivered = tx.send("Hello".to_string()).await.is_ok();
                release.notified().await;
                for i in 0..32 {
                    delivered &= tx.send(format!(" {}", i)).await.is_ok();
                }
                if let Some(report) = report {
                    let _ = report.send(delivered);
                }
            });
            Ok(handle)
        }
    }

    struct FailingGateway;

    #[async_trait]
    impl LlmGateway for FailingGateway {
        async fn chat_stream(
            &self,
            _system_prompt: &str,
            _history: &[String],
            _cancellation: CancellationToken,
        ) -> Result<StreamHandle, GatewayError> {
            Err(GatewayError::ConnectionError("refused".to_string()))
        }
    }

    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    fn fast_config() -> RoomConfig {
        RoomConfig::default()
            .with_turn_delay(Duration::from_millis(5))
            .with_interrupted_turn_delay(Duration::from_millis(5))
            .with_error_backoff(Duration::from_millis(5))
            .with_inject_timeout(Duration::from_millis(500))
    }

    fn scripted_room(names: &[&str], config: RoomConfig) -> Room {
        let agents = names
            .iter()
            .map(|name| {
                let text = format!("{} speaks", name);
                Agent::new(*name, format!("You are {}", name), ScriptedGateway::new(&[&text]))
            })
            .collect();
        Room::with_config(agents, config).unwrap()
    }

    async fn next(rx: &mut mpsc::Receiver<Message>) -> Message {
        tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for broadcast")
            .expect("broadcast closed")
    }

    async fn next_of_kind(rx: &mut mpsc::Receiver<Message>, kind: MessageKind) -> Message {
        loop {
            let msg = next(rx).await;
            if msg.kind == kind {
                return msg;
            }
        }
    }

    // ==================== Construction ====================

    #[test]
    fn test_new_rejects_empty_and_duplicate_rosters() {
        assert!(matches!(
            Room::new(vec![]),
            Err(RoomError::InvalidRoster(DomainError::NoAgents))
        ));

        let gateway = ScriptedGateway::new(&["x"]);
        let agents = vec![
            Agent::new("A", "p", gateway.clone()),
            Agent::new("A", "q", gateway),
        ];
        assert!(matches!(
            Room::new(agents),
            Err(RoomError::InvalidRoster(DomainError::DuplicateAgent(_)))
        ));
    }

    // ==================== Turn Order ====================

    #[tokio::test]
    async fn test_first_turns_follow_construction_order() {
        let mut room = scripted_room(&["A", "B"], fast_config());
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        assert_eq!(next(&mut rx).await, Message::start("A"));
        assert_eq!(next(&mut rx).await, Message::chunk("A", "A speaks"));
        assert_eq!(next(&mut rx).await, Message::end("A"));
        assert_eq!(next(&mut rx).await, Message::start("B"));

        let history = room.finish().await.unwrap();
        assert_eq!(history.entries()[0], Message::turn("A", "A speaks"));
    }

    #[tokio::test]
    async fn test_seed_line_precedes_history_in_context() {
        let gateway = ScriptedGateway::new(&["ok"]);
        let agents = vec![Agent::new("A", "p", gateway.clone())];
        let mut room = Room::with_config(agents, fast_config()).unwrap();
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        next_of_kind(&mut rx, MessageKind::End).await;
        next_of_kind(&mut rx, MessageKind::End).await;
        room.finish().await.unwrap();

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls[0], vec!["Moderator: Please discuss the topic: T".to_string()]);
        assert_eq!(
            calls[1],
            vec![
                "Moderator: Please discuss the topic: T".to_string(),
                "A: ok".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_resume_starts_after_last_speaker() {
        let mut room = scripted_room(&["A", "B", "C"], fast_config());
        room.set_history(History::from(vec![
            Message::turn("A", "one"),
            Message::turn("B", "two"),
        ]))
        .unwrap();
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("").unwrap();

        assert_eq!(next(&mut rx).await, Message::start("C"));
        next_of_kind(&mut rx, MessageKind::End).await;
        assert_eq!(next(&mut rx).await, Message::start("A"));
        room.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_resume_after_unknown_sender_starts_with_first_agent() {
        let mut room = scripted_room(&["A", "B"], fast_config());
        room.set_history(History::from(vec![
            Message::turn("B", "two"),
            Message::turn("Judge", "verdict"),
        ]))
        .unwrap();
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("").unwrap();

        assert_eq!(next(&mut rx).await, Message::start("A"));
        room.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_every_start_has_exactly_one_end() {
        let mut room = scripted_room(&["A", "B"], fast_config());
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        let mut open: Option<String> = None;
        for _ in 0..12 {
            let msg = next(&mut rx).await;
            match msg.kind {
                MessageKind::Start => {
                    assert!(open.is_none(), "start while {:?} still open", open);
                    open = Some(msg.sender);
                }
                MessageKind::End => {
                    assert_eq!(open.take().as_deref(), Some(msg.sender.as_str()));
                }
                _ => {}
            }
        }
        room.finish().await.unwrap();
    }

    // ==================== Failures ====================

    #[tokio::test]
    async fn test_failed_stream_ends_turn_with_error_and_moves_on() {
        let agents = vec![
            Agent::new("A", "p", Arc::new(FailingGateway)),
            Agent::new("B", "q", ScriptedGateway::new(&["fine"])),
        ];
        let mut room = Room::with_config(agents, fast_config()).unwrap();
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        assert_eq!(next(&mut rx).await, Message::start("A"));
        let end = next(&mut rx).await;
        assert_eq!(end.kind, MessageKind::End);
        assert_eq!(end.content, "[Error: Connection error: refused]");
        assert_eq!(next(&mut rx).await, Message::start("B"));

        let history = room.finish().await.unwrap();
        assert!(history.iter().all(|m| m.sender != "A"));
    }

    // ==================== Interventions ====================

    #[tokio::test]
    async fn test_intervention_interrupts_streaming_turn() {
        let released = Arc::new(Notify::new());
        let agents = vec![
            Agent::new(
                "A",
                "p",
                Arc::new(StallingGateway {
                    first: "Hello".to_string(),
                    released: Arc::clone(&released),
                }),
            ),
            Agent::new("B", "q", ScriptedGateway::new(&["reply"])),
        ];
        let mut room = Room::with_config(agents, fast_config()).unwrap();
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        assert_eq!(next(&mut rx).await, Message::start("A"));
        assert_eq!(next(&mut rx).await, Message::chunk("A", "Hello"));

        assert!(room.inject_message(Message::user("wait")).await);

        assert_eq!(next(&mut rx).await, Message::user("wait"));
        assert_eq!(next(&mut rx).await, Message::end("A"));
        assert_eq!(next(&mut rx).await, Message::start("B"));

        tokio::time::timeout(WAIT, released.notified())
            .await
            .expect("abandoned stream was never cancelled");

        let history = room.finish().await.unwrap();
        assert_eq!(history.entries()[0].content, "A: Hello [Interrupted]");
        assert_eq!(history.entries()[0].sender, "A");
        assert_eq!(history.entries()[1].content, "User (Intervention): wait");
        assert_eq!(history.entries()[1].sender, "User");
    }

    #[tokio::test]
    async fn test_interrupted_stream_is_drained_to_the_end() {
        let release = Arc::new(Notify::new());
        let (report_tx, report_rx) = oneshot::channel();
        let agents = vec![
            Agent::new(
                "A",
                "p",
                Arc::new(StubbornGateway {
                    calls: AtomicUsize::new(0),
                    release: Arc::clone(&release),
                    report: Mutex::new(Some(report_tx)),
                }),
            ),
            Agent::new("B", "q", ScriptedGateway::new(&["reply"])),
        ];
        let mut room = Room::with_config(agents, fast_config()).unwrap();
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        assert_eq!(next(&mut rx).await, Message::start("A"));
        assert_eq!(next(&mut rx).await, Message::chunk("A", "Hello"));
        assert!(room.inject_message(Message::user("stop there")).await);
        assert_eq!(next(&mut rx).await, Message::user("stop there"));
        assert_eq!(next(&mut rx).await, Message::end("A"));

        // The burst only starts once the turn has been abandoned.
        release.notify_one();
        let delivered = tokio::time::timeout(WAIT, report_rx)
            .await
            .expect("producer stayed blocked on the abandoned stream")
            .unwrap();
        assert!(delivered, "abandoned stream was closed instead of drained");

        let history = room.finish().await.unwrap();
        assert_eq!(history.entries()[0].content, "A: Hello [Interrupted]");
        assert!(history.iter().all(|m| !m.content.contains(" 31")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_turn_pauses_shorter_than_completed_turn() {
        let released = Arc::new(Notify::new());
        let agents = vec![
            Agent::new(
                "A",
                "p",
                Arc::new(StallingGateway {
                    first: "Hello".to_string(),
                    released,
                }),
            ),
            Agent::new("B", "q", ScriptedGateway::new(&["reply"])),
        ];
        let config = RoomConfig::default();
        let (short, long) = (config.interrupted_turn_delay, config.turn_delay);
        let mut room = Room::with_config(agents, config).unwrap();
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        next_of_kind(&mut rx, MessageKind::Chunk).await;
        assert!(room.inject_message(Message::user("wait")).await);
        assert_eq!(next(&mut rx).await, Message::user("wait"));
        assert_eq!(next(&mut rx).await, Message::end("A"));
        let interrupted_at = Instant::now();
        assert_eq!(next(&mut rx).await, Message::start("B"));
        let after_interrupt = interrupted_at.elapsed();

        assert_eq!(next_of_kind(&mut rx, MessageKind::End).await, Message::end("B"));
        let completed_at = Instant::now();
        assert_eq!(next(&mut rx).await, Message::start("A"));
        let after_completion = completed_at.elapsed();

        assert!(
            after_interrupt >= short && after_interrupt < long,
            "interrupted turn paused {:?}",
            after_interrupt
        );
        assert!(after_completion >= long, "completed turn paused {:?}", after_completion);
        room.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_intervention_between_turns_cuts_in_line() {
        let config = fast_config().with_turn_delay(Duration::from_millis(200));
        let mut room = scripted_room(&["A", "B"], config);
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        assert_eq!(next(&mut rx).await, Message::start("A"));
        next_of_kind(&mut rx, MessageKind::End).await;
        assert!(room.inject_message(Message::user("hi")).await);

        let record = next(&mut rx).await;
        assert_eq!(record.kind, MessageKind::Full);
        assert_eq!(record.content, "User (Intervention): hi");
        assert_eq!(next(&mut rx).await, Message::system("User intervened."));
        assert_eq!(next(&mut rx).await, Message::start("B"));

        let history = room.finish().await.unwrap();
        assert_eq!(history.entries()[0].content, "A: A speaks");
        assert_eq!(history.entries()[1].content, "User (Intervention): hi");
    }

    #[tokio::test]
    async fn test_message_injected_before_start_is_admitted_first() {
        let mut room = scripted_room(&["A", "B"], fast_config());
        let mut rx = room.take_broadcast().unwrap();
        assert!(room.inject_message(Message::user("early")).await);
        room.start_loop("T").unwrap();

        assert_eq!(next(&mut rx).await.content, "User (Intervention): early");
        assert_eq!(next(&mut rx).await.kind, MessageKind::System);
        assert_eq!(next(&mut rx).await, Message::start("A"));
        room.finish().await.unwrap();
    }

    // ==================== Stopping ====================

    #[tokio::test]
    async fn test_double_stop_is_harmless() {
        let mut room = scripted_room(&["A", "B"], fast_config());
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();
        next_of_kind(&mut rx, MessageKind::End).await;

        let first = room.stop_handle();
        let second = room.stop_handle();
        let a = tokio::spawn(async move { first.cancel() });
        let b = tokio::spawn(async move { second.cancel() });
        a.await.unwrap();
        b.await.unwrap();
        room.stop_loop();

        room.wait_stopped().await.unwrap();
        let snapshot = room.history().unwrap().clone();
        room.stop_loop();
        assert_eq!(room.history().unwrap(), &snapshot);
        assert!(!room.inject_message(Message::user("too late")).await);

        let history = room.finish().await.unwrap();
        assert_eq!(history, snapshot);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let mut room = scripted_room(&["A"], fast_config());
        room.start_loop("T").unwrap();
        assert!(matches!(room.start_loop("T"), Err(RoomError::AlreadyStarted)));
        assert!(matches!(
            room.set_history(History::new()),
            Err(RoomError::AlreadyStarted)
        ));
        room.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_wait_leaves_room_running() {
        let mut room = scripted_room(&["A", "B"], fast_config());
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();
        next_of_kind(&mut rx, MessageKind::End).await;

        let waited = tokio::time::timeout(Duration::from_millis(20), room.wait_stopped()).await;
        assert!(waited.is_err(), "scheduler exited without a stop");
        assert!(room.is_running());

        let history = room.finish().await.unwrap();
        assert_eq!(history.entries()[0], Message::turn("A", "A speaks"));
    }

    #[tokio::test]
    async fn test_history_updates_follow_recorded_turns() {
        let mut room = scripted_room(&["A", "B"], fast_config());
        let mut updates = room.subscribe_history();
        let _rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        let seen = tokio::time::timeout(WAIT, updates.wait_for(|h| h.len() >= 2))
            .await
            .expect("no history updates")
            .unwrap()
            .clone();
        assert_eq!(seen.entries()[0], Message::turn("A", "A speaks"));
        assert_eq!(seen.entries()[1], Message::turn("B", "B speaks"));

        let history = room.finish().await.unwrap();
        assert_eq!(*updates.borrow(), history);
    }

    #[tokio::test]
    async fn test_dropped_spectator_stops_room() {
        let mut room = scripted_room(&["A", "B"], fast_config());
        let rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();
        drop(rx);

        tokio::time::timeout(WAIT, room.stop_handle().cancelled())
            .await
            .expect("room kept running without a spectator");
        room.finish().await.unwrap();
    }

    // ==================== Judge ====================

    #[tokio::test]
    async fn test_judge_stops_loop_and_appends_verdict() {
        let logger = Arc::new(RecordingLogger {
            events: Mutex::new(Vec::new()),
        });
        let mut room = scripted_room(&["A", "B"], fast_config()).with_logger(logger.clone());
        let mut rx = room.take_broadcast().unwrap();
        room.start_loop("T").unwrap();

        next_of_kind(&mut rx, MessageKind::End).await;
        let collector = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(msg) = rx.recv().await {
                seen.push(msg);
            }
            seen
        });

        let judge = ScriptedGateway::new(&["A ", "wins"]);
        room.judge(judge.clone()).await.unwrap();
        let history = room.finish().await.unwrap();
        let seen = tokio::time::timeout(WAIT, collector).await.unwrap().unwrap();

        assert_eq!(history.last().unwrap(), &Message::turn("Judge", "A wins"));
        assert_eq!(history.iter().filter(|m| m.sender == "Judge").count(), 1);

        let judge_start = seen
            .iter()
            .position(|m| *m == Message::start("Judge"))
            .expect("judge never started");
        assert_eq!(seen.last().unwrap(), &Message::end("Judge"));
        assert!(seen[judge_start + 1..]
            .iter()
            .all(|m| m.sender == "Judge" && m.kind != MessageKind::Start));

        let calls = judge.calls.lock().unwrap();
        assert_eq!(calls[0].len(), history.len() - 1);
        assert!(logger.events.lock().unwrap().contains(&"verdict"));
    }

    #[tokio::test]
    async fn test_second_judge_is_rejected() {
        let mut room = scripted_room(&["A"], fast_config());
        let _rx = room.take_broadcast().unwrap();
        room.set_history(History::from(vec![Message::turn("A", "one")]))
            .unwrap();

        let judge = ScriptedGateway::new(&["A wins"]);
        room.judge(judge.clone()).await.unwrap();
        assert!(matches!(
            room.judge(judge.clone()).await,
            Err(RoomError::AlreadyJudged)
        ));
        assert_eq!(judge.calls.lock().unwrap().len(), 1);

        let history = room.finish().await.unwrap();
        assert_eq!(history.iter().filter(|m| m.sender == "Judge").count(), 1);
    }

    #[tokio::test]
    async fn test_judge_failure_emits_placeholder() {
        let mut room = scripted_room(&["A", "B"], fast_config());
        let mut rx = room.take_broadcast().unwrap();
        room.set_history(History::from(vec![Message::turn("A", "one")]))
            .unwrap();

        room.judge(Arc::new(FailingGateway)).await.unwrap();

        assert_eq!(next(&mut rx).await, Message::start("Judge"));
        let end = next(&mut rx).await;
        assert_eq!(end.kind, MessageKind::End);
        assert_eq!(end.content, colloquy_domain::ConversationText::JUDGE_UNAVAILABLE);
        assert_eq!(room.history().unwrap().len(), 1);
        assert!(room.is_stopped());
    }
}
