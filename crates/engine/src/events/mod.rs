use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use plebchat_shared::{ExecutionEvent, NodeOutputType};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("could not connect to {service}: {reason}")]
    Connection { service: String, reason: String },
    #[error("{service} timed out")]
    Timeout { service: String },
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("node `{node}` failed: {message}")]
    Node { node: String, message: String },
    #[error("graph run was cancelled")]
    Cancelled,
    #[error("graph task ended abnormally: {0}")]
    Aborted(String),
}

impl GraphError {
    /// Text shown to the chat user. Never includes internal detail.
    pub fn user_message(&self) -> String {
        match self {
            GraphError::Connection { service, .. } => {
                format!("⚠️ Connection to the {service} failed. Please check that it is running.")
            }
            GraphError::Timeout { service } => {
                format!("⚠️ The {service} took too long to respond.")
            }
            GraphError::Llm(LlmError::Connect { .. }) => {
                "⚠️ Connection to the language model failed. Please check that it is running.".to_string()
            }
            GraphError::Llm(LlmError::Timeout { .. }) => {
                "⚠️ The language model took too long to respond.".to_string()
            }
            GraphError::Llm(_) => "⚠️ The language model returned an error.".to_string(),
            GraphError::Node { node, .. } => format!("⚠️ Something went wrong in `{node}`."),
            GraphError::Cancelled | GraphError::Aborted(_) => {
                "⚠️ The graph stopped unexpectedly.".to_string()
            }
        }
    }

    /// Classify a failed call to an HTTP service other than the model.
    pub fn from_http(service: &str, node: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GraphError::Timeout { service: service.to_string() }
        } else if err.is_connect() {
            GraphError::Connection { service: service.to_string(), reason: err.to_string() }
        } else {
            GraphError::Node { node: node.to_string(), message: err.to_string() }
        }
    }

    /// Full failure detail, written to the stream only in debug mode.
    pub fn detail(&self) -> String {
        format!("{self}\n\n{self:#?}")
    }
}

pub type EventResult = Result<ExecutionEvent, GraphError>;

/// Handle node code uses to publish events, in the manner of a graph
/// runtime's stream writer.
#[derive(Clone)]
pub struct EventWriter {
    tx: mpsc::Sender<EventResult>,
}

impl EventWriter {
    pub fn new(tx: mpsc::Sender<EventResult>) -> Self {
        Self { tx }
    }

    pub async fn emit(&self, event: ExecutionEvent) -> Result<(), GraphError> {
        self.tx.send(Ok(event)).await.map_err(|_| GraphError::Cancelled)
    }

    /// Reasoning line. A trailing newline is appended.
    pub async fn think(&self, text: impl AsRef<str>) -> Result<(), GraphError> {
        self.emit(ExecutionEvent::thought(format!("{}\n", text.as_ref()))).await
    }

    pub async fn answer(&self, text: impl Into<String>) -> Result<(), GraphError> {
        self.emit(ExecutionEvent::content(text)).await
    }

    pub async fn think_codeblock(&self, value: &serde_json::Value) -> Result<(), GraphError> {
        let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        self.think(format!("```json\n{pretty}\n```")).await
    }

    /// Mark `node` as active without producing text.
    pub async fn enter(&self, node: &Node) -> Result<(), GraphError> {
        self.token(node, "").await
    }

    /// Token fragment produced by `node`.
    pub async fn token(&self, node: &Node, text: impl Into<String>) -> Result<(), GraphError> {
        self.emit(ExecutionEvent::message(node.id, node.output_type, text)).await
    }

    pub(crate) async fn fail(&self, error: GraphError) {
        // Reader gone: nobody to tell.
        let _ = self.tx.send(Err(error)).await;
    }
}

/// Node identity and declared output type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub id: &'static str,
    pub output_type: Option<NodeOutputType>,
}

impl Node {
    pub const fn thought(id: &'static str) -> Self {
        Self { id, output_type: Some(NodeOutputType::Thought) }
    }

    pub const fn answer(id: &'static str) -> Self {
        Self { id, output_type: Some(NodeOutputType::Answer) }
    }

    pub const fn untagged(id: &'static str) -> Self {
        Self { id, output_type: None }
    }
}

/// Event stream of one running graph. Dropping it aborts the graph task.
pub struct GraphRun {
    events: ReceiverStream<EventResult>,
    task: JoinHandle<()>,
}

impl GraphRun {
    pub fn new(rx: mpsc::Receiver<EventResult>, task: JoinHandle<()>) -> Self {
        Self { events: ReceiverStream::new(rx), task }
    }
}

impl Stream for GraphRun {
    type Item = EventResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for GraphRun {
    fn drop(&mut self) {
        self.task.abort();
    }
}
