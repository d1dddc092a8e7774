//! Debate session driver

use super::command::SessionCommand;
use crate::config::OutputConfig;
use crate::output::ConsoleRenderer;
use crate::progress::ThinkingIndicator;
use colloquy_application::{
    Agent, ConversationLogger, ConversationRepository, LlmGateway, RepositoryError, Room,
    RoomConfig, RoomError,
};
use colloquy_domain::{Conversation, ConversationStatus, History, Message, MessageKind};
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("Could not save conversation: {0}")]
    Repository(#[from] RepositoryError),
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// A verdict was delivered; the conversation is concluded.
    Judged,
    Quit,
    /// Ctrl-C at the terminal.
    Interrupted,
    /// The input stream ended or failed.
    InputClosed,
    /// The room stopped on its own (its output went away).
    Stopped,
}

#[derive(Debug)]
pub struct SessionOutcome {
    /// The conversation as saved.
    pub conversation: Conversation,
    pub ending: SessionEnd,
}

/// One spectator session over a stored conversation.
pub struct DebateSession {
    gateway: Arc<dyn LlmGateway>,
    repository: Arc<dyn ConversationRepository>,
    room_config: RoomConfig,
    logger: Option<Arc<dyn ConversationLogger>>,
    output: OutputConfig,
    writer: Box<dyn Write + Send>,
}

impl DebateSession {
    pub fn new(gateway: Arc<dyn LlmGateway>, repository: Arc<dyn ConversationRepository>) -> Self {
        Self {
            gateway,
            repository,
            room_config: RoomConfig::default(),
            logger: None,
            output: OutputConfig::default(),
            writer: Box::new(std::io::stdout()),
        }
    }

    pub fn with_room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_output_config(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Where rendered output goes (stdout by default).
    pub fn with_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.writer = writer;
        self
    }

    /// Runs the conversation until judged, quit, or input ends, then saves it.
    ///
    /// A conversation with history resumes where it stopped; an empty one
    /// opens with its topic. Every recorded entry is also saved as it lands,
    /// so a session that is killed outright keeps what was said.
    pub async fn run(
        self,
        mut conversation: Conversation,
        mut input: mpsc::Receiver<String>,
    ) -> Result<SessionOutcome, SessionError> {
        let Self {
            gateway,
            repository,
            room_config,
            logger,
            output,
            writer,
        } = self;

        let agents = conversation
            .agents
            .iter()
            .cloned()
            .map(|profile| Agent::from_profile(profile, Arc::clone(&gateway)))
            .collect();
        let mut room = Room::with_config(agents, room_config)?;
        if let Some(logger) = logger {
            room = room.with_logger(logger);
        }
        room.set_history(conversation.history.clone())?;

        let broadcast = room.take_broadcast().ok_or(RoomError::AlreadyStarted)?;
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let renderer = tokio::spawn(render(broadcast, notice_rx, writer, output.show_progress));

        let injector = room.injector();
        let stop = room.stop_handle();

        repository.save(&conversation).await?;
        let checkpoints = tokio::spawn(checkpoint(
            Arc::clone(&repository),
            conversation.clone(),
            room.subscribe_history(),
        ));

        info!(
            "Session {} ({} history entries)",
            conversation.id,
            conversation.history.len()
        );
        room.start_loop(conversation.seed_topic())?;

        let ending = loop {
            let line = tokio::select! {
                biased;
                _ = stop.cancelled() => break SessionEnd::Stopped,
                _ = tokio::signal::ctrl_c() => break SessionEnd::Interrupted,
                line = input.recv() => line,
            };
            let Some(line) = line else {
                break SessionEnd::InputClosed;
            };

            match SessionCommand::parse(&line) {
                SessionCommand::Judge => {
                    room.judge(Arc::clone(&gateway)).await?;
                    break SessionEnd::Judged;
                }
                SessionCommand::Quit => break SessionEnd::Quit,
                SessionCommand::Help => {
                    let _ = notices.send(SessionCommand::help_text().to_string());
                }
                SessionCommand::Unknown(cmd) => {
                    let _ = notices.send(format!("Unknown command {} (try /help)\n", cmd));
                }
                SessionCommand::Say(text) => {
                    if !injector.inject(Message::user(text)).await {
                        let _ = notices.send("(not delivered; a message is already waiting)\n".to_string());
                    }
                }
                SessionCommand::Empty => {}
            }
        };
        info!("Session {} ending: {:?}", conversation.id, ending);

        drop(notices);
        let history = room.finish().await?;
        if let Err(e) = renderer.await {
            warn!("Renderer task failed: {}", e);
        }
        if let Err(e) = checkpoints.await {
            warn!("Checkpoint task failed: {}", e);
        }

        conversation.history = history;
        if ending == SessionEnd::Judged {
            conversation.status = ConversationStatus::Concluded;
        }
        conversation.touch();
        repository.save(&conversation).await?;

        Ok(SessionOutcome {
            conversation,
            ending,
        })
    }
}

/// Saves the conversation each time the room records an entry.
///
/// Ends when the room is gone; a failed save is logged and retried with the
/// next entry.
async fn checkpoint(
    repository: Arc<dyn ConversationRepository>,
    mut conversation: Conversation,
    mut updates: watch::Receiver<History>,
) {
    while updates.changed().await.is_ok() {
        conversation.history = updates.borrow_and_update().clone();
        conversation.touch();
        match repository.save(&conversation).await {
            Ok(()) => debug!(
                "Checkpointed {} ({} entries)",
                conversation.id,
                conversation.history.len()
            ),
            Err(e) => warn!("Checkpoint of {} failed: {}", conversation.id, e),
        }
    }
}

/// Prints the broadcast until the room closes it.
async fn render(
    mut broadcast: mpsc::Receiver<Message>,
    mut notices: mpsc::UnboundedReceiver<String>,
    mut writer: Box<dyn Write + Send>,
    show_progress: bool,
) {
    let mut renderer = ConsoleRenderer::new();
    let mut thinking = ThinkingIndicator::new(show_progress);

    loop {
        let text = tokio::select! {
            biased;
            Some(notice) = notices.recv() => {
                let mut text = renderer.close_line();
                text.push_str(&notice);
                text
            }
            message = broadcast.recv() => match message {
                Some(message) => {
                    if message.kind == MessageKind::Start {
                        thinking.start(&message.sender);
                    } else {
                        thinking.stop();
                    }
                    renderer.render(&message)
                }
                None => break,
            },
        };

        if write!(writer, "{}", text).and_then(|_| writer.flush()).is_err() {
            break;
        }
    }

    thinking.stop();
    let _ = write!(writer, "{}", renderer.close_line());
    let _ = writer.flush();
}

/// Lines typed on stdin; the channel closes at EOF or on a read error.
///
/// Reads on a plain thread so a pending read never holds up shutdown.
pub fn spawn_stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}
