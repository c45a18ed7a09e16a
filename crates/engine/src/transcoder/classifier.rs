use plebchat_shared::{Channel, ExecutionEvent, NodeOutputType};

/// Channel an event's text belongs to.
pub fn classify(event: &ExecutionEvent) -> Channel {
    match event {
        ExecutionEvent::Custom { kind, .. } => *kind,
        ExecutionEvent::Message { output_type, .. } => channel_for_node(*output_type),
    }
}

pub fn channel_for_node(output_type: Option<NodeOutputType>) -> Channel {
    match output_type {
        Some(NodeOutputType::Thought) => Channel::Thought,
        Some(NodeOutputType::Answer) => Channel::Content,
        // Untagged nodes stay visible.
        None => Channel::Content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_events_carry_their_channel() {
        assert_eq!(classify(&ExecutionEvent::thought("a")), Channel::Thought);
        assert_eq!(classify(&ExecutionEvent::content("a")), Channel::Content);
    }

    #[test]
    fn message_channel_follows_node_metadata() {
        let thought = ExecutionEvent::message("n", Some(NodeOutputType::Thought), "a");
        let answer = ExecutionEvent::message("n", Some(NodeOutputType::Answer), "a");
        assert_eq!(classify(&thought), Channel::Thought);
        assert_eq!(classify(&answer), Channel::Content);
    }

    #[test]
    fn missing_metadata_defaults_to_content() {
        let untagged = ExecutionEvent::message("n", None, "a");
        assert_eq!(classify(&untagged), Channel::Content);
    }
}
