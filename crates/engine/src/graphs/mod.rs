//! Graph runner and the built-in graphs.

pub mod echobot;
pub mod fren;
pub mod registry;
pub mod research;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{FutureExt, StreamExt};
use plebchat_shared::{ChatMessage, GraphInfo};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::commands::{adapter, CommandTable, ParsedCommand};
use crate::config::GraphConfig;
use crate::events::{EventWriter, GraphError, GraphRun, Node};
use crate::llm::ChatModel;

pub use registry::GraphRegistry;

pub const CHECK_FOR_COMMAND: Node = Node::untagged("_check_for_command");
pub const HANDLE_COMMAND: Node = Node::untagged("handle_command");

/// Conversation a graph runs on.
#[derive(Debug, Clone, Default)]
pub struct GraphInput {
    pub query: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl GraphInput {
    pub fn new(query: Option<String>, messages: Vec<ChatMessage>) -> Self {
        Self { query, messages }
    }

    /// Non-blank `query`, else the content of the last user message.
    pub fn latest_user_text(&self) -> Option<&str> {
        if let Some(query) = self.query() {
            return Some(query);
        }
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }

    /// The message list with `query`, if any, as the closing user turn.
    pub fn conversation(&self) -> Vec<ChatMessage> {
        let mut messages = self.messages.clone();
        if let Some(query) = self.query() {
            let already_last = messages
                .last()
                .is_some_and(|m| m.role == "user" && m.content == query);
            if !already_last {
                messages.push(ChatMessage::user(query));
            }
        }
        messages
    }

    fn query(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

/// What a running graph can reach.
#[derive(Clone)]
pub struct GraphContext {
    pub config: GraphConfig,
    pub http: Client,
    pub model: Arc<dyn ChatModel>,
}

#[async_trait]
pub trait Graph: Send + Sync {
    fn info(&self) -> GraphInfo;

    fn commands(&self) -> Option<&'static CommandTable> {
        None
    }

    async fn execute(
        &self,
        input: GraphInput,
        ctx: GraphContext,
        writer: EventWriter,
    ) -> Result<(), GraphError>;
}

/// Start `graph` on its own task. Its failure, if any, is the last item of
/// the returned stream.
pub fn launch(graph: Arc<dyn Graph>, input: GraphInput, ctx: GraphContext, buffer: usize) -> GraphRun {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let writer = EventWriter::new(tx);

    let task = tokio::spawn(async move {
        let id = graph.info().id;
        let outcome = AssertUnwindSafe(graph.execute(input, ctx, writer.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(GraphError::Aborted(format!("graph `{id}` panicked"))));
        match outcome {
            Ok(()) => debug!(graph = %id, "graph finished"),
            Err(GraphError::Cancelled) => debug!(graph = %id, "graph cancelled, reader gone"),
            Err(e) => {
                error!(graph = %id, error = %e, "graph failed");
                writer.fail(e).await;
            }
        }
    });

    GraphRun::new(rx, task)
}

/// Route the latest user text to `table` if it is a command. Returns whether
/// the turn was handled. `narrate` writes the routing decision as reasoning.
pub async fn route_command(
    input: &GraphInput,
    ctx: &GraphContext,
    writer: &EventWriter,
    table: &CommandTable,
    narrate: bool,
) -> Result<bool, GraphError> {
    writer.enter(&CHECK_FOR_COMMAND).await?;
    let text = input.latest_user_text().unwrap_or_default();

    let command = match ParsedCommand::parse(text) {
        Some(command) if !ctx.config.disable_commands => command,
        _ => {
            if narrate {
                writer.think(">> no command... continue").await?;
                writer.think("\n---\n").await?;
            }
            return Ok(false);
        }
    };

    if narrate {
        writer.think(format!(">> I found a command! `{}`", text.trim())).await?;
        writer.think("\n---\n").await?;
    }

    writer.enter(&HANDLE_COMMAND).await?;
    let result = table.dispatch(&ctx.http, &ctx.config, &command).await;
    adapter::deliver(result, ctx.model.as_ref(), writer).await?;
    Ok(true)
}

/// Stream a model reply as `node`'s messages. Returns the full reply.
pub async fn stream_reply(
    model: &dyn ChatModel,
    node: &Node,
    messages: Vec<ChatMessage>,
    writer: &EventWriter,
) -> Result<String, GraphError> {
    writer.enter(node).await?;
    let mut tokens = model.stream_chat(messages).await?;
    let mut reply = String::new();
    while let Some(token) = tokens.next().await {
        let token = token?;
        reply.push_str(&token);
        writer.token(node, token).await?;
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_wins_over_messages() {
        let input = GraphInput::new(
            Some("from query".to_string()),
            vec![ChatMessage::user("older"), ChatMessage::assistant("reply")],
        );
        assert_eq!(input.latest_user_text(), Some("from query"));
        assert_eq!(input.conversation().last().unwrap().content, "from query");
    }

    #[test]
    fn falls_back_to_last_user_message() {
        let input = GraphInput::new(
            None,
            vec![ChatMessage::user("first"), ChatMessage::user("second"), ChatMessage::assistant("x")],
        );
        assert_eq!(input.latest_user_text(), Some("second"));
        assert_eq!(input.conversation().len(), 3);
        assert_eq!(GraphInput::default().latest_user_text(), None);
    }

    #[test]
    fn blank_query_is_ignored() {
        let input = GraphInput::new(Some("  ".to_string()), vec![ChatMessage::user("real")]);
        assert_eq!(input.latest_user_text(), Some("real"));
        assert_eq!(input.conversation().len(), 1);
        assert_eq!(GraphInput::new(Some(String::new()), vec![]).latest_user_text(), None);
    }
}
