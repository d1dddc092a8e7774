//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod output;
mod provider;
mod room;
mod storage;

pub use output::FileOutputConfig;
pub use provider::FileProviderConfig;
pub use room::FileRoomConfig;
pub use storage::FileStorageConfig;

use colloquy_domain::AgentProfile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Configuration errors that prevent a session from starting
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("agent name cannot be empty")]
    EmptyAgentName,

    #[error("duplicate agent name: {0}")]
    DuplicateAgentName(String),

    #[error("at least one agent is required")]
    NoAgents,

    #[error("provider.history_window cannot be 0")]
    ZeroHistoryWindow,

    #[error("provider.model cannot be empty")]
    EmptyModelName,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat completions endpoint
    pub provider: FileProviderConfig,
    /// Turn loop pacing
    pub room: FileRoomConfig,
    /// Conversation store location
    pub storage: FileStorageConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Default roster for new conversations
    pub agents: Vec<AgentProfile>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            provider: FileProviderConfig::default(),
            room: FileRoomConfig::default(),
            storage: FileStorageConfig::default(),
            output: FileOutputConfig::default(),
            agents: AgentProfile::default_roster(),
        }
    }
}

impl FileConfig {
    /// Validate the configuration.
    ///
    /// Errors stop the session; the returned warnings are worth showing but
    /// the session can still run.
    pub fn validate(&self) -> Result<Vec<String>, ConfigValidationError> {
        if self.provider.history_window == 0 {
            return Err(ConfigValidationError::ZeroHistoryWindow);
        }
        if self.provider.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        validate_agents(&self.agents)?;

        let mut warnings = Vec::new();
        if self.agents.len() < 2 {
            warnings.push(format!(
                "only {} agent configured; the conversation will be a monologue",
                self.agents.len()
            ));
        }
        if self.provider.api_key.is_some() {
            warnings.push(
                "provider.api_key is set in a config file; prefer provider.api_key_env".to_string(),
            );
        }
        Ok(warnings)
    }
}

/// Checks a roster for missing or duplicate names.
pub fn validate_agents(agents: &[AgentProfile]) -> Result<(), ConfigValidationError> {
    if agents.is_empty() {
        return Err(ConfigValidationError::NoAgents);
    }
    let mut seen = HashSet::new();
    for agent in agents {
        if agent.name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyAgentName);
        }
        if !seen.insert(agent.name.as_str()) {
            return Err(ConfigValidationError::DuplicateAgentName(agent.name.clone()));
        }
    }
    Ok(())
}
