//! Console rendering for the room broadcast and stored conversations

use colloquy_domain::{Conversation, ConversationText, Message, MessageKind};
use colored::Colorize;

/// Turns broadcast messages into terminal text.
///
/// Stateful only in whether a speaker's line is still open, so that a
/// notice arriving mid-stream starts on a fresh line.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    line_open: bool,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to print for one broadcast message.
    pub fn render(&mut self, message: &Message) -> String {
        match message.kind {
            MessageKind::Start => {
                let mut out = self.close_line();
                out.push_str(&format!("\n{}\n", Self::speaker_header(&message.sender)));
                self.line_open = true;
                out
            }
            MessageKind::Chunk => {
                self.line_open = true;
                message.content.clone()
            }
            MessageKind::End => {
                let mut out = self.close_line();
                if !message.content.is_empty() {
                    out.push_str(&format!("{}\n", message.content.red()));
                }
                out
            }
            MessageKind::System => {
                let mut out = self.close_line();
                out.push_str(&format!("{}\n", format!("* {}", message.content).cyan().italic()));
                out
            }
            MessageKind::Full => {
                let mut out = self.close_line();
                out.push_str(&format!("{}\n", Self::record_line(message).green().bold()));
                out
            }
        }
    }

    /// Newline to close a speaker's line, if one is open.
    pub fn close_line(&mut self) -> String {
        if std::mem::take(&mut self.line_open) {
            "\n".to_string()
        } else {
            String::new()
        }
    }

    fn speaker_header(sender: &str) -> String {
        let header = format!("── {} ──", sender);
        if sender == ConversationText::JUDGE_SENDER {
            header.magenta().bold().to_string()
        } else {
            header.yellow().bold().to_string()
        }
    }

    /// Records carry their own "Sender: " prefix; injected messages don't.
    fn record_line(message: &Message) -> String {
        if message.content.starts_with(&message.sender) {
            message.content.clone()
        } else {
            format!("{}: {}", message.sender, message.content)
        }
    }

    /// One line per stored conversation for `list`.
    pub fn format_conversation_list(conversations: &[Conversation]) -> String {
        if conversations.is_empty() {
            return "No conversations yet. Start one with `colloquy new --topic ...`\n".to_string();
        }

        let mut output = String::new();
        for conv in conversations {
            let agents: Vec<&str> = conv.agents.iter().map(|a| a.name.as_str()).collect();
            output.push_str(&format!(
                "{}  {}  {:<9}  {:>3} entries  {}  [{}]\n",
                conv.id.cyan(),
                conv.updated_at.format("%Y-%m-%d %H:%M"),
                conv.status.to_string(),
                conv.history.len(),
                conv.topic.bold(),
                agents.join(", ")
            ));
        }
        output
    }

    /// Full transcript for `show`.
    pub fn format_transcript(conversation: &Conversation) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {}\n",
            "Topic:".cyan().bold(),
            conversation.topic
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Status:".cyan().bold(),
            conversation.status
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Agents:".cyan().bold(),
            conversation
                .agents
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        for entry in conversation.history.iter() {
            output.push('\n');
            if entry.sender == ConversationText::JUDGE_SENDER {
                output.push_str(&format!("{}\n", Self::speaker_header(&entry.sender)));
            }
            output.push_str(&format!("{}\n", entry.content));
        }

        output
    }
}
