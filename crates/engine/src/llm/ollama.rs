use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use plebchat_shared::ChatMessage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ChatModel, LlmError, ModelProvider, TokenStream};
use crate::config::GraphConfig;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    keep_alive: Value,
}

#[derive(Deserialize, Debug, Default)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize, Debug)]
struct StreamChunk {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Streaming chat against Ollama's `/api/chat`.
#[derive(Clone)]
pub struct OllamaModel {
    client: Client,
    url: String,
    model: String,
    keep_alive: String,
}

impl OllamaModel {
    pub fn new(client: Client, config: &GraphConfig) -> Self {
        Self {
            client,
            url: format!("{}/api/chat", config.ollama_base_url.trim_end_matches('/')),
            model: config.llm_model.clone(),
            keep_alive: config.keep_alive.clone(),
        }
    }

    /// Ollama reads bare integers as seconds and strings as durations.
    fn keep_alive_value(&self) -> Value {
        match self.keep_alive.parse::<i64>() {
            Ok(seconds) => Value::from(seconds),
            Err(_) => Value::from(self.keep_alive.clone()),
        }
    }
}

#[async_trait]
impl ChatModel for OllamaModel {
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TokenStream, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
            keep_alive: self.keep_alive_value(),
        };

        debug!(url = %self.url, model = %self.model, "opening model stream");
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        Ok(token_stream(self.url.clone(), response.bytes_stream().boxed()))
    }
}

struct LineReader {
    url: String,
    bytes: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: Vec<u8>,
    finished: bool,
}

impl LineReader {
    fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    fn fail(mut self, err: LlmError) -> Option<(Result<String, LlmError>, Self)> {
        self.finished = true;
        self.buffer.clear();
        Some((Err(err), self))
    }
}

/// Split the NDJSON body into content fragments, skipping empty ones.
fn token_stream(url: String, bytes: BoxStream<'static, reqwest::Result<Bytes>>) -> TokenStream {
    let reader = LineReader { url, bytes, buffer: Vec::new(), finished: false };

    stream::unfold(reader, |mut reader| async move {
        loop {
            while let Some(line) = reader.next_line() {
                if line.is_empty() {
                    continue;
                }
                let chunk: StreamChunk = match serde_json::from_str(&line) {
                    Ok(chunk) => chunk,
                    Err(e) => return reader.fail(LlmError::Decode(e)),
                };
                if let Some(error) = chunk.error {
                    return reader.fail(LlmError::Stream(error));
                }
                if chunk.done {
                    reader.finished = true;
                }
                let content = chunk.message.unwrap_or_default().content;
                if !content.is_empty() {
                    return Some((Ok(content), reader));
                }
            }

            if reader.finished {
                return None;
            }

            let next = reader.bytes.next().await;
            match next {
                Some(Ok(bytes)) => reader.buffer.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    let err = LlmError::from_reqwest(&reader.url, e);
                    return reader.fail(err);
                }
                None => {
                    // Flush a trailing line without a newline.
                    reader.finished = true;
                    if !reader.buffer.is_empty() {
                        reader.buffer.push(b'\n');
                    }
                }
            }
        }
    })
    .boxed()
}

#[derive(Clone)]
pub struct OllamaProvider {
    client: Client,
}

impl OllamaProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ModelProvider for OllamaProvider {
    fn model(&self, config: &GraphConfig) -> Arc<dyn ChatModel> {
        Arc::new(OllamaModel::new(self.client.clone(), config))
    }
}
