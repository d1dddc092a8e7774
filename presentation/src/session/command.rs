//! Parsing of spectator input lines

/// What a line typed during a session asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Ask the judge for a verdict and end the session.
    Judge,
    Quit,
    Help,
    /// Plain text to inject into the conversation.
    Say(String),
    /// A slash command we don't know.
    Unknown(String),
    Empty,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return SessionCommand::Empty;
        }
        if !line.starts_with('/') {
            return SessionCommand::Say(line.to_string());
        }

        match line.split_whitespace().next().unwrap_or(line) {
            "/judge" | "/conclude" => SessionCommand::Judge,
            "/quit" | "/exit" | "/q" => SessionCommand::Quit,
            "/help" | "/h" | "/?" => SessionCommand::Help,
            other => SessionCommand::Unknown(other.to_string()),
        }
    }

    pub fn help_text() -> &'static str {
        r#"Commands:
  <text>      Cut in; the current speaker stops and everyone hears you
  /judge      Ask the judge for a verdict and end the debate (alias /conclude)
  /quit       Leave; the conversation is saved and can be resumed
  /help       Show this help
"#
    }
}
