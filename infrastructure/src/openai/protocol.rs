//! Wire types for the chat completions endpoint

use serde::{Deserialize, Serialize};

/// Request body sent to `/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub stream: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> ChatRequest<'a> {
    /// System prompt followed by the last `window` history lines as user turns.
    pub fn streaming(
        model: &'a str,
        system_prompt: &'a str,
        history: &'a [String],
        window: usize,
    ) -> Self {
        let recent = &history[history.len().saturating_sub(window)..];
        let messages = std::iter::once(ChatMessage {
            role: "system",
            content: system_prompt,
        })
        .chain(recent.iter().map(|line| ChatMessage {
            role: "user",
            content: line,
        }))
        .collect();

        Self {
            model,
            messages,
            stream: true,
        }
    }
}

/// One `data:` payload of a streamed completion.
#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Non-empty content of the first choice.
    pub fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_last_window_of_history() {
        let history: Vec<String> = (0..12).map(|i| format!("line {}", i)).collect();
        let request = ChatRequest::streaming("gpt-4o", "be brief", &history, 10);

        assert_eq!(request.messages.len(), 11);
        assert_eq!(
            request.messages[0],
            ChatMessage {
                role: "system",
                content: "be brief"
            }
        );
        assert_eq!(request.messages[1].content, "line 2");
        assert_eq!(request.messages[10].content, "line 11");
        assert!(request.messages[1..].iter().all(|m| m.role == "user"));
    }

    #[test]
    fn test_request_serializes_stream_flag() {
        let history = vec!["hi".to_string()];
        let request = ChatRequest::streaming("m", "s", &history, 10);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], true);
        assert_eq!(value["model"], "m");
        assert_eq!(value["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_chunk_content_extraction() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#).unwrap();
        assert_eq!(chunk.into_content(), Some("Hel".to_string()));

        let role_only: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(role_only.into_content(), None);

        let null_content: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":null}}]}"#).unwrap();
        assert_eq!(null_content.into_content(), None);

        let empty: ChatCompletionChunk = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.into_content(), None);
    }
}
