//! Event-stream transcoder.
//!
//! Consumes the execution events of one graph run and writes a strictly
//! ordered chat-completion frame stream: `start`, status and text frames in
//! arrival order, then exactly one terminal frame. Failures of the event
//! source are turned into in-band error frames; a closed sink stops the loop
//! and drops the source.

pub mod classifier;
pub mod encoder;
pub mod state;
pub mod tracker;

use std::future::Future;

use futures_util::{Stream, StreamExt};
use plebchat_shared::{Channel, ExecutionEvent, Frame};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::events::{EventResult, GraphError};
use encoder::Control;
use state::StreamState;
use tracker::{Injection, NodeTracker, RUNNING};

pub use tracker::TrackerOptions;

pub const GRAPH_ERROR_STATUS: &str = "Graph error!";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("frame sink closed")]
pub struct SinkClosed;

/// Where frames go. Implemented for the response channel and, for tests,
/// for a plain `Vec`.
pub trait FrameSink: Send {
    fn emit(&mut self, frame: Frame) -> impl Future<Output = Result<(), SinkClosed>> + Send;
}

impl FrameSink for mpsc::Sender<Frame> {
    async fn emit(&mut self, frame: Frame) -> Result<(), SinkClosed> {
        mpsc::Sender::send(self, frame).await.map_err(|_| SinkClosed)
    }
}

impl FrameSink for Vec<Frame> {
    async fn emit(&mut self, frame: Frame) -> Result<(), SinkClosed> {
        Vec::push(self, frame);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Source exhausted; `stop` written.
    Completed,
    /// Source failed; `error` written.
    Failed,
    /// Client went away before the stream finished.
    Disconnected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscoderOptions {
    /// Append failure detail to error output.
    pub debug: bool,
    pub tracker: TrackerOptions,
}

/// Counts frames on their way to the sink.
struct Output<'a, S> {
    sink: &'a mut S,
    frames: usize,
}

impl<S: FrameSink> Output<'_, S> {
    async fn send(&mut self, frame: impl Into<Frame>) -> Result<(), SinkClosed> {
        self.sink.emit(frame.into()).await?;
        self.frames += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transcoder {
    options: TranscoderOptions,
    tracker: NodeTracker,
}

impl Transcoder {
    pub fn new(options: TranscoderOptions) -> Self {
        Self { options, tracker: NodeTracker::new(options.tracker) }
    }

    /// Drive `events` to completion, writing frames to `sink`.
    pub async fn run<E, S>(&self, mut events: E, sink: &mut S) -> Termination
    where
        E: Stream<Item = EventResult> + Unpin,
        S: FrameSink,
    {
        let mut state = StreamState::default();
        let mut out = Output { sink, frames: 0 };

        let termination = match self.drive(&mut events, &mut state, &mut out).await {
            Ok(termination) => termination,
            Err(SinkClosed) => {
                debug!(node = ?state.current_node, "client disconnected, dropping graph run");
                Termination::Disconnected
            }
        };
        info!(?termination, frames = out.frames, "stream closed");
        termination
    }

    async fn drive<E, S>(
        &self,
        events: &mut E,
        state: &mut StreamState,
        out: &mut Output<'_, S>,
    ) -> Result<Termination, SinkClosed>
    where
        E: Stream<Item = EventResult> + Unpin,
        S: FrameSink,
    {
        out.send(encoder::encode_control(Control::Start)).await?;
        state.started = true;
        out.send(encoder::status(RUNNING, false)).await?;

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => self.handle(event, state, out).await?,
                Err(error) => {
                    self.tracker.close(state);
                    return self.fail(error, state, out).await;
                }
            }
        }

        self.tracker.close(state);
        out.send(encoder::status("", true)).await?;
        out.send(encoder::encode_control(Control::Stop)).await?;
        Ok(Termination::Completed)
    }

    async fn handle<S: FrameSink>(
        &self,
        event: ExecutionEvent,
        state: &mut StreamState,
        out: &mut Output<'_, S>,
    ) -> Result<(), SinkClosed> {
        let channel = classifier::classify(&event);
        match event {
            ExecutionEvent::Custom { text, .. } => self.write_text(channel, text, state, out).await,
            ExecutionEvent::Message { text, node_id, .. } => {
                for injection in self.tracker.observe(state, &node_id, channel) {
                    match injection {
                        Injection::Status(description) => {
                            out.send(encoder::status(description, false)).await?
                        }
                        Injection::Header(header) => {
                            self.write_text(channel, header, state, out).await?
                        }
                    }
                }
                if text.is_empty() {
                    return Ok(());
                }
                self.write_text(channel, text, state, out).await
            }
        }
    }

    /// Write a text frame, preceded by a break when the channel changes.
    async fn write_text<S: FrameSink>(
        &self,
        channel: Channel,
        text: String,
        state: &mut StreamState,
        out: &mut Output<'_, S>,
    ) -> Result<(), SinkClosed> {
        if state.last_channel.is_some_and(|last| last != channel) {
            out.send(encoder::channel_break(channel)).await?;
        }
        state.last_channel = Some(channel);
        out.send(encoder::encode(channel, text)).await
    }

    async fn fail<S: FrameSink>(
        &self,
        error: GraphError,
        state: &mut StreamState,
        out: &mut Output<'_, S>,
    ) -> Result<Termination, SinkClosed> {
        warn!(error = %error, node = ?state.current_node, "graph run failed");
        state.errored = true;

        self.write_text(Channel::Content, error.user_message(), state, out).await?;
        if self.options.debug {
            let detail = format!("\n\n```\n{}\n```", error.detail());
            self.write_text(Channel::Content, detail, state, out).await?;
        }
        out.send(encoder::encode_control(Control::Error)).await?;
        out.send(encoder::status(GRAPH_ERROR_STATUS, true)).await?;
        Ok(Termination::Failed)
    }
}
