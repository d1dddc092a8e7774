//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    #[error("Duplicate agent name: {0}")]
    DuplicateAgent(String),

    #[error("A conversation needs at least one agent")]
    NoAgents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomainError::DuplicateAgent("A".to_string()).to_string(),
            "Duplicate agent name: A"
        );
        assert_eq!(
            DomainError::NoAgents.to_string(),
            "A conversation needs at least one agent"
        );
    }
}
