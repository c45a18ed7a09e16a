use plebchat_shared::{Channel, FinishReason, Frame, WireFrame};

pub const CHANNEL_BREAK: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
    Error,
}

pub fn encode(channel: Channel, text: impl Into<String>) -> WireFrame {
    WireFrame::text(channel, text)
}

pub fn encode_control(control: Control) -> WireFrame {
    match control {
        Control::Start => WireFrame::empty(None),
        Control::Stop => WireFrame::empty(Some(FinishReason::Stop)),
        Control::Error => WireFrame::empty(Some(FinishReason::Error)),
    }
}

/// Paragraph break written on `channel` when the stream switches to it.
pub fn channel_break(channel: Channel) -> WireFrame {
    WireFrame::text(channel, CHANNEL_BREAK)
}

pub fn status(description: impl Into<String>, done: bool) -> Frame {
    Frame::status(description, done)
}
