use serde::{Deserialize, Serialize};

/// Output channel of streamed text.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Reasoning text, carried as `reasoning_content`.
    Thought,
    /// User-visible answer text, carried as `content`.
    Content,
}

/// Output type a graph node declares in its metadata.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeOutputType {
    Thought,
    Answer,
}

/// One item produced by a running agent graph.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// Explicit emission from node code.
    Custom {
        kind: Channel,
        text: String,
    },
    /// Token fragment attributed to an execution node.
    Message {
        text: String,
        node_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_type: Option<NodeOutputType>,
    },
}

impl ExecutionEvent {
    pub fn thought(text: impl Into<String>) -> Self {
        ExecutionEvent::Custom { kind: Channel::Thought, text: text.into() }
    }

    pub fn content(text: impl Into<String>) -> Self {
        ExecutionEvent::Custom { kind: Channel::Content, text: text.into() }
    }

    pub fn message(
        node_id: impl Into<String>,
        output_type: Option<NodeOutputType>,
        text: impl Into<String>,
    ) -> Self {
        ExecutionEvent::Message {
            text: text.into(),
            node_id: node_id.into(),
            output_type,
        }
    }
}
