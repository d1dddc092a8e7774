//! Agent adapter
//!
//! Binds an [`AgentProfile`] to the gateway that produces its token stream.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, StreamHandle};
use colloquy_domain::AgentProfile;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// A named conversational participant.
///
/// Immutable after construction; cloning shares the gateway.
#[derive(Clone)]
pub struct Agent {
    profile: AgentProfile,
    gateway: Arc<dyn LlmGateway>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        gateway: Arc<dyn LlmGateway>,
    ) -> Self {
        Self::from_profile(AgentProfile::new(name, system_prompt), gateway)
    }

    pub fn from_profile(profile: AgentProfile, gateway: Arc<dyn LlmGateway>) -> Self {
        Self { profile, gateway }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.profile.prompt
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Ask the model for this agent's next turn given the conversation so far.
    pub async fn speak(
        &self,
        history: &[String],
        cancellation: CancellationToken,
    ) -> Result<StreamHandle, GatewayError> {
        self.gateway
            .chat_stream(&self.profile.prompt, history, cancellation)
            .await
            .inspect_err(|e| warn!("Agent {} LLM error: {}", self.profile.name, e))
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.profile.name)
            .finish_non_exhaustive()
    }
}
