//! LLM Gateway port
//!
//! Defines the minimal contract the room needs from a model provider:
//! send a system prompt plus rolling history, receive text fragments.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while establishing a stream
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Missing API key (set {0})")]
    MissingApiKey(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for LLM communication
///
/// Implementations (adapters) live in the infrastructure layer. An `Err`
/// means the stream could not be established; once a [`StreamHandle`] is
/// returned it yields zero or more fragments and then closes, with no
/// mid-stream errors.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Start a streamed completion.
    ///
    /// Producers must stop once `cancellation` fires or the handle's
    /// receiver is dropped.
    async fn chat_stream(
        &self,
        system_prompt: &str,
        history: &[String],
        cancellation: CancellationToken,
    ) -> Result<StreamHandle, GatewayError>;
}

/// Handle for receiving the text fragments of one streamed completion.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<String>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Creates a connected producer/handle pair.
    pub fn channel(buffer: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx))
    }

    /// Next fragment, or `None` once the producer has closed the stream.
    pub async fn next_fragment(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> String {
        let mut full_text = String::new();
        while let Some(fragment) = self.receiver.recv().await {
            full_text.push_str(&fragment);
        }
        full_text
    }

    /// Discard the rest of an abandoned stream on a background task.
    ///
    /// The task ends exactly when the producer closes the channel, so a
    /// producer blocked on a full buffer is always released.
    pub fn drain(mut self) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut discarded = 0;
            while self.receiver.recv().await.is_some() {
                discarded += 1;
            }
            discarded
        })
    }
}
