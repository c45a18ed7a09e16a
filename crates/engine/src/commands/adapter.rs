use futures_util::StreamExt;
use plebchat_shared::{ChatMessage, CommandResult};
use tracing::debug;

use crate::events::{EventWriter, GraphError};
use crate::llm::ChatModel;

pub const DEFAULT_REINJECTION_PROMPT: &str =
    "Process this information and provide a helpful response:";

/// Turn a command result into events.
///
/// Direct results become a single content event. Anything else is echoed as
/// reasoning and then handed to `model`, whose reply streams as content.
pub async fn deliver(
    result: CommandResult,
    model: &dyn ChatModel,
    writer: &EventWriter,
) -> Result<(), GraphError> {
    if result.return_direct {
        return writer.answer(result.text).await;
    }

    writer.think("Processing command output with LLM...").await?;
    writer.think("---").await?;
    writer.think("### command output:").await?;
    writer.think(&result.text).await?;
    writer.think("---").await?;

    let prompt = result
        .reinjection_prompt
        .as_deref()
        .unwrap_or(DEFAULT_REINJECTION_PROMPT);
    let messages = vec![
        ChatMessage::system(prompt),
        ChatMessage::user(format!("{prompt}\n\n{}", result.text)),
    ];

    debug!(chars = result.text.len(), "reinjecting command output");
    let mut tokens = model.stream_chat(messages).await?;
    while let Some(token) = tokens.next().await {
        writer.answer(token?).await?;
    }
    Ok(())
}
