//! On-wire frames of the chat-completion SSE stream.
//!
//! Every frame is serialized as `data: <compact json>\n\n`. Choice frames
//! follow the OpenAI chunk shape; status notices use a separate `event`
//! envelope that clients render as a progress indicator.

use serde::{Deserialize, Serialize};

use crate::events::Channel;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Error,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub delta: Delta,
    pub finish_reason: Option<FinishReason>,
}

/// A chat-completion chunk. Always holds exactly one choice.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WireFrame {
    pub choices: Vec<Choice>,
}

impl WireFrame {
    pub fn text(channel: Channel, text: impl Into<String>) -> Self {
        let text = text.into();
        let delta = match channel {
            Channel::Thought => Delta { reasoning_content: Some(text), ..Delta::default() },
            Channel::Content => Delta { content: Some(text), ..Delta::default() },
        };
        Self::single(delta, None)
    }

    pub fn empty(finish_reason: Option<FinishReason>) -> Self {
        Self::single(Delta::default(), finish_reason)
    }

    fn single(delta: Delta, finish_reason: Option<FinishReason>) -> Self {
        Self { choices: vec![Choice { delta, finish_reason }] }
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.choices.first().and_then(|c| c.finish_reason)
    }

    /// Channel and text carried by this frame, if any.
    pub fn text_delta(&self) -> Option<(Channel, &str)> {
        let delta = &self.choices.first()?.delta;
        if let Some(text) = &delta.reasoning_content {
            return Some((Channel::Thought, text));
        }
        delta.content.as_deref().map(|text| (Channel::Content, text))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StatusNotice {
    pub description: String,
    pub done: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutOfBand {
    Status(StatusNotice),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventEnvelope {
    pub event: OutOfBand,
}

/// Anything that travels as one `data:` line.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum Frame {
    Chunk(WireFrame),
    Event(EventEnvelope),
}

impl Frame {
    pub fn status(description: impl Into<String>, done: bool) -> Self {
        Frame::Event(EventEnvelope {
            event: OutOfBand::Status(StatusNotice {
                description: description.into(),
                done,
            }),
        })
    }

    pub fn as_chunk(&self) -> Option<&WireFrame> {
        match self {
            Frame::Chunk(chunk) => Some(chunk),
            Frame::Event(_) => None,
        }
    }

    pub fn as_status(&self) -> Option<&StatusNotice> {
        match self {
            Frame::Event(EventEnvelope { event: OutOfBand::Status(notice) }) => Some(notice),
            Frame::Chunk(_) => None,
        }
    }

    pub fn to_json(&self) -> String {
        // Plain structs of strings, bools and options cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_sse(&self) -> String {
        format!("data: {}\n\n", self.to_json())
    }

    /// Parse one SSE line (`data: {...}`). Returns `None` for blank lines,
    /// comments and payloads that are not frames.
    pub fn parse_sse_line(line: &str) -> Option<Self> {
        let data = line.strip_prefix("data:")?.trim();
        if data.is_empty() {
            return None;
        }
        serde_json::from_str(data).ok()
    }
}

impl From<WireFrame> for Frame {
    fn from(frame: WireFrame) -> Self {
        Frame::Chunk(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_frame_is_bit_exact() {
        let frame = Frame::from(WireFrame::text(Channel::Content, "hi"));
        assert_eq!(
            frame.to_sse(),
            "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"},\"finish_reason\":null}]}\n\n"
        );
    }

    #[test]
    fn reasoning_frame_uses_reasoning_content() {
        let frame = Frame::from(WireFrame::text(Channel::Thought, "hmm"));
        assert_eq!(
            frame.to_json(),
            r#"{"choices":[{"delta":{"reasoning_content":"hmm"},"finish_reason":null}]}"#
        );
    }

    #[test]
    fn control_frames_carry_empty_delta() {
        let stop = Frame::from(WireFrame::empty(Some(FinishReason::Stop)));
        assert_eq!(stop.to_json(), r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#);
        let error = Frame::from(WireFrame::empty(Some(FinishReason::Error)));
        assert_eq!(error.to_json(), r#"{"choices":[{"delta":{},"finish_reason":"error"}]}"#);
    }

    #[test]
    fn status_uses_event_envelope() {
        assert_eq!(
            Frame::status("Running…", false).to_json(),
            r#"{"event":{"type":"status","data":{"description":"Running…","done":false}}}"#
        );
    }

    #[test]
    fn parses_both_frame_kinds() {
        let status = Frame::parse_sse_line(r#"data: {"event":{"type":"status","data":{"description":"","done":true}}}"#)
            .unwrap();
        assert!(status.as_status().unwrap().done);

        let chunk = Frame::parse_sse_line(r#"data: {"choices":[{"delta":{"content":"x"},"finish_reason":null}]}"#)
            .unwrap();
        assert_eq!(chunk.as_chunk().unwrap().text_delta(), Some((Channel::Content, "x")));

        assert!(Frame::parse_sse_line("").is_none());
        assert!(Frame::parse_sse_line(": ping").is_none());
    }
}
