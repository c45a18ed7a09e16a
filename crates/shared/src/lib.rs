pub mod events;
pub mod frames;
pub mod schemas;

pub use events::{Channel, ExecutionEvent, NodeOutputType};
pub use frames::{FinishReason, Frame, StatusNotice, WireFrame};
pub use schemas::{ChatMessage, CommandResult, GraphInfo, GraphRequest};
