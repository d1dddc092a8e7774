//! Judge
//!
//! One-shot concluding turn: streams a verdict over the whole history
//! under the sender "Judge" and appends it as the final entry.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::LlmGateway;
use colloquy_domain::{ConversationText, History, Message, MessageKind, PromptTemplate};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Streams the verdict. The scheduler must already have exited.
///
/// A verdict that cannot be started degrades to a placeholder `end`
/// message and leaves the history untouched.
pub(super) async fn deliver_verdict(
    gateway: &dyn LlmGateway,
    history: &mut History,
    broadcast: &mpsc::Sender<Message>,
    logger: &dyn ConversationLogger,
) {
    let judge = ConversationText::JUDGE_SENDER;
    info!("Judging conversation of {} entries", history.len());

    announce(broadcast, Message::start(judge)).await;

    let context = history.contents();
    let mut stream = match gateway
        .chat_stream(PromptTemplate::judge_system(), &context, CancellationToken::new())
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Judge could not start a verdict: {}", e);
            logger.log(ConversationEvent::new(
                "verdict_failed",
                serde_json::json!({ "error": e.to_string() }),
            ));
            announce(
                broadcast,
                Message::new(judge, ConversationText::JUDGE_UNAVAILABLE, MessageKind::End),
            )
            .await;
            return;
        }
    };

    let mut verdict = String::new();
    while let Some(fragment) = stream.next_fragment().await {
        verdict.push_str(&fragment);
        announce(broadcast, Message::chunk(judge, fragment)).await;
    }
    announce(broadcast, Message::end(judge)).await;

    let record = Message::turn(judge, &verdict);
    logger.log(ConversationEvent::new(
        "verdict",
        serde_json::json!({ "sender": record.sender, "content": record.content }),
    ));
    history.push(record);
}

/// The verdict is recorded even when nobody is watching.
async fn announce(broadcast: &mpsc::Sender<Message>, message: Message) {
    if broadcast.send(message).await.is_err() {
        debug!("Broadcast reader gone; verdict continues unobserved");
    }
}
