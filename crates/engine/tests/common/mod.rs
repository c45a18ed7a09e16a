#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use plebchat_engine::config::GraphConfig;
use plebchat_engine::llm::{ChatModel, LlmError, ModelProvider, TokenStream};
use plebchat_shared::{ChatMessage, Frame};

/// Replies with fixed tokens and records every prompt it was sent.
#[derive(Default)]
pub struct CannedModel {
    tokens: Vec<String>,
    refuse: bool,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl CannedModel {
    pub fn replying(tokens: &[&str]) -> Arc<Self> {
        Arc::new(Self { tokens: tokens.iter().map(|t| t.to_string()).collect(), ..Self::default() })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self { refuse: true, ..Self::default() })
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for CannedModel {
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TokenStream, LlmError> {
        self.prompts.lock().unwrap().push(messages);
        if self.refuse {
            return Err(LlmError::Connect {
                url: "http://ollama.test/api/chat".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(stream::iter(self.tokens.clone().into_iter().map(Ok)).boxed())
    }
}

pub struct CannedProvider(pub Arc<CannedModel>);

impl ModelProvider for CannedProvider {
    fn model(&self, _: &GraphConfig) -> Arc<dyn ChatModel> {
        self.0.clone()
    }
}

/// Split an SSE body into frames.
pub fn parse_body(body: &str) -> Vec<Frame> {
    body.lines().filter_map(Frame::parse_sse_line).collect()
}

pub fn terminal_count(frames: &[Frame]) -> usize {
    frames
        .iter()
        .filter_map(Frame::as_chunk)
        .filter(|c| c.finish_reason().is_some())
        .count()
}
