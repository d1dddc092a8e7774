//! OpenAI-compatible LLM Gateway implementation

use super::protocol::ChatRequest;
use super::sse;
use crate::config::FileProviderConfig;
use async_trait::async_trait;
use colloquy_application::ports::llm_gateway::{GatewayError, LlmGateway, StreamHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Fragments buffered between the HTTP body and the consumer.
const FRAGMENT_BUFFER: usize = 32;

/// Streaming gateway for any endpoint speaking the chat completions protocol.
#[derive(Clone)]
pub struct OpenAiCompatibleGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    history_window: usize,
}

impl OpenAiCompatibleGateway {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            base_url.trim_end_matches('/').to_string()
        };

        Self {
            client: reqwest::Client::new(),
            base_url,
            model: model.into(),
            api_key: api_key.into(),
            history_window: 10,
        }
    }

    /// Builds a gateway from the `[provider]` section.
    ///
    /// The key comes from `api_key` if set, otherwise from the environment
    /// variable named by `api_key_env`.
    pub fn from_config(config: &FileProviderConfig) -> Result<Self, GatewayError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| GatewayError::MissingApiKey(config.api_key_env.clone()))?;

        info!(
            "OpenAiCompatibleGateway initialized (model: {}, base url: {})",
            config.model, config.base_url
        );

        Ok(Self::new(&config.base_url, &config.model, api_key)
            .with_history_window(config.history_window))
    }

    /// Number of most recent history lines sent with each request.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl std::fmt::Debug for OpenAiCompatibleGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleGateway")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("history_window", &self.history_window)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn chat_stream(
        &self,
        system_prompt: &str,
        history: &[String],
        cancellation: CancellationToken,
    ) -> Result<StreamHandle, GatewayError> {
        let request = ChatRequest::streaming(&self.model, system_prompt, history, self.history_window);
        debug!(
            "POST {} ({} messages)",
            self.endpoint(),
            request.messages.len()
        );

        let send = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(GatewayError::Cancelled),
            response = send => response.map_err(|e| GatewayError::ConnectionError(e.to_string()))?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!("{} - {}", status, body)));
        }

        let (tx, handle) = StreamHandle::channel(FRAGMENT_BUFFER);
        tokio::spawn(async move {
            let forwarded = sse::pump(response.bytes_stream(), tx, cancellation).await;
            debug!("Completion stream closed after {} fragments", forwarded);
        });

        Ok(handle)
    }
}
