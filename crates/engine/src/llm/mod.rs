pub mod ollama;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use plebchat_shared::ChatMessage;
use thiserror::Error;

use crate::config::GraphConfig;

pub use ollama::{OllamaModel, OllamaProvider};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("could not connect to model backend at {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("model backend at {url} timed out")]
    Timeout { url: String },
    #[error("model backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model stream failed: {0}")]
    Stream(String),
    #[error("could not decode model output: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LlmError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout { url: url.to_string() }
        } else if err.is_connect() {
            LlmError::Connect { url: url.to_string(), reason: err.to_string() }
        } else {
            LlmError::Stream(err.to_string())
        }
    }
}

/// Incremental text fragments of one model reply.
pub type TokenStream = BoxStream<'static, Result<String, LlmError>>;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Open a streaming completion. Connection failures surface here, later
    /// failures as items of the returned stream.
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TokenStream, LlmError>;
}

/// Builds the model a graph run talks to from its resolved settings.
pub trait ModelProvider: Send + Sync {
    fn model(&self, config: &GraphConfig) -> Arc<dyn ChatModel>;
}
