use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Body of `POST /graph/{graph_id}`.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct GraphRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Entry of `GET /graphs`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct GraphInfo {
    pub id: String,
    pub name: String,
}

/// Output of a chat command.
///
/// When `return_direct` is false the text is fed back to the model together
/// with `reinjection_prompt`; a missing prompt means the generic default.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub text: String,
    pub return_direct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinjection_prompt: Option<String>,
}

impl CommandResult {
    pub fn direct(text: impl Into<String>) -> Self {
        Self { text: text.into(), return_direct: true, reinjection_prompt: None }
    }

    pub fn reinject(text: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            return_direct: false,
            reinjection_prompt: Some(prompt.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
