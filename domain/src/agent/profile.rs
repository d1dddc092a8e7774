//! Agent profile value object

use serde::{Deserialize, Serialize};

/// Persisted description of a conversational participant.
///
/// Identity is by name: rooms resume turn order by matching the last
/// history sender against profile names, so names must be unique per room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    /// System prompt establishing the agent's persona.
    pub prompt: String,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
        }
    }

    /// Default debating pair: a Socratic questioner and a pragmatist.
    pub fn default_roster() -> Vec<AgentProfile> {
        vec![
            AgentProfile::new(
                "Socrates",
                "You are a Socratic philosopher. You guide the discussion with probing \
                 counter-questions and rarely state conclusions outright.",
            ),
            AgentProfile::new(
                "Student",
                "You are a pragmatic modern university student. You look for direct, \
                 practical answers and push back on abstractions.",
            ),
        ]
    }
}

impl std::str::FromStr for AgentProfile {
    type Err = crate::DomainError;

    /// Parses `NAME=PROMPT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, prompt) = s
            .split_once('=')
            .ok_or_else(|| crate::DomainError::InvalidAgent(format!("expected NAME=PROMPT, got '{}'", s)))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(crate::DomainError::InvalidAgent("agent name is empty".to_string()));
        }
        Ok(AgentProfile::new(name, prompt.trim()))
    }
}
