use plebchat_shared::Channel;

use super::state::StreamState;

pub const RUNNING: &str = "Running…";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerOptions {
    /// Include the node id in "Running…" notices.
    pub verbose_node_names: bool,
    /// Write a node-name header into the node's channel on entry.
    pub node_headers: bool,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self { verbose_node_names: true, node_headers: false }
    }
}

/// Something the tracker wants written when a node becomes active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    Status(String),
    /// Text frame on the entered node's channel.
    Header(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeTracker {
    options: TrackerOptions,
}

impl NodeTracker {
    pub fn new(options: TrackerOptions) -> Self {
        Self { options }
    }

    /// Record that `node_id` produced a message. Returns what to inject if
    /// this is a transition into a new node.
    pub fn observe(&self, state: &mut StreamState, node_id: &str, channel: Channel) -> Vec<Injection> {
        if state.closed || state.current_node.as_deref() == Some(node_id) {
            return Vec::new();
        }
        state.current_node = Some(node_id.to_string());

        // Graph-internal nodes are not surfaced to the client.
        if node_id.starts_with('_') {
            return Vec::new();
        }

        let mut injected = Vec::new();
        let description = if self.options.verbose_node_names {
            format!("{RUNNING} {node_id}")
        } else {
            RUNNING.to_string()
        };
        injected.push(Injection::Status(description));

        if self.options.node_headers {
            match channel {
                Channel::Thought => {
                    injected.push(Injection::Header("\n".to_string()));
                    injected.push(Injection::Header(format!("### `{node_id}`")));
                    injected.push(Injection::Header("\n".to_string()));
                }
                Channel::Content => {
                    injected.push(Injection::Header(format!("## {node_id}")));
                    injected.push(Injection::Header("\n\n".to_string()));
                }
            }
        }
        injected
    }

    /// Enter the terminal state. Returns false if it was already closed.
    pub fn close(&self, state: &mut StreamState) -> bool {
        if state.closed {
            return false;
        }
        state.closed = true;
        true
    }
}
