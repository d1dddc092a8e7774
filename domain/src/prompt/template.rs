//! Prompt templates and fixed conversation text

/// Fixed strings that appear in broadcasts and persisted history.
pub struct ConversationText;

impl ConversationText {
    pub const INTERVENTION_PREFIX: &'static str = "User (Intervention): ";
    pub const INTERRUPTED_MARKER: &'static str = " [Interrupted]";
    pub const INTERVENED_NOTICE: &'static str = "User intervened.";
    pub const JUDGE_SENDER: &'static str = "Judge";
    /// Shown as the verdict when the judge's stream cannot be started.
    pub const JUDGE_UNAVAILABLE: &'static str =
        "The judge has locked themselves in their chambers and declined to rule...";
}

/// Templates for generating prompts
pub struct PromptTemplate;

impl PromptTemplate {
    /// Opening context line that seeds a fresh debate.
    pub fn seed_line(topic: &str) -> String {
        format!("Moderator: Please discuss the topic: {}", topic)
    }

    /// System prompt for the concluding verdict.
    pub fn judge_system() -> &'static str {
        r#"You are an impartial debate judge with a sense of humour.
Read the debate transcript above and critique both sides' performance.
Point out the highlights and the logical gaps in each argument, then declare a winner (or a draw).
Respond in Markdown and keep it under 500 words."#
    }
}
