use plebchat_shared::Channel;

/// Per-request transcoder state. Created when a stream opens and dropped
/// when it closes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamState {
    pub current_node: Option<String>,
    pub started: bool,
    pub errored: bool,
    /// Channel of the last text frame written.
    pub last_channel: Option<Channel>,
    pub closed: bool,
}
