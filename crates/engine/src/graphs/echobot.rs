use async_trait::async_trait;
use plebchat_shared::GraphInfo;

use super::{Graph, GraphContext, GraphInput};
use crate::events::{EventWriter, GraphError, Node};

const ECHO: Node = Node::answer("echo");

/// Repeats the latest user message. Useful for checking the pipe end to end.
pub struct EchoBot;

#[async_trait]
impl Graph for EchoBot {
    fn info(&self) -> GraphInfo {
        GraphInfo { id: "echobot".to_string(), name: "EchoBot".to_string() }
    }

    async fn execute(
        &self,
        input: GraphInput,
        ctx: GraphContext,
        writer: EventWriter,
    ) -> Result<(), GraphError> {
        if ctx.config.debug {
            let config = serde_json::to_value(&ctx.config).unwrap_or_default();
            writer.think_codeblock(&config).await?;
            writer.think("Geesh... this guy's an idiot amirite?").await?;
        }
        let echoback = input.latest_user_text().unwrap_or_default().to_string();
        writer.token(&ECHO, echoback).await
    }
}
