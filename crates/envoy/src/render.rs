use std::io::Write;

use plebchat_shared::{Channel, FinishReason, Frame};

/// Writes reasoning and status to `err` and answer text to `out`.
pub struct Renderer<O: Write, E: Write> {
    out: O,
    err: E,
    finish: Option<FinishReason>,
    wrote_content: bool,
}

impl<O: Write, E: Write> Renderer<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err, finish: None, wrote_content: false }
    }

    pub fn handle(&mut self, frame: &Frame) -> std::io::Result<()> {
        if let Some(status) = frame.as_status() {
            if !status.description.is_empty() {
                writeln!(self.err, "[{}]", status.description)?;
            }
            return Ok(());
        }

        let Some(chunk) = frame.as_chunk() else {
            return Ok(());
        };
        if let Some(reason) = chunk.finish_reason() {
            self.finish = Some(reason);
        }
        match chunk.text_delta() {
            Some((Channel::Thought, text)) => {
                write!(self.err, "{text}")?;
                self.err.flush()?;
            }
            Some((Channel::Content, text)) => {
                write!(self.out, "{text}")?;
                self.out.flush()?;
                self.wrote_content = true;
            }
            None => {}
        }
        Ok(())
    }

    /// Finish reason of the stream, once its terminal frame was seen.
    pub fn finish(&mut self) -> std::io::Result<Option<FinishReason>> {
        if self.wrote_content {
            writeln!(self.out)?;
        }
        Ok(self.finish)
    }

    #[cfg(test)]
    fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

/// Shown when the server cannot be reached.
pub fn connection_failure(kind: &str, message: &str, server_url: &str) -> String {
    format!(
        "🚨 GRAPH EXECUTION HALTED!\nConnection to server failed: `{kind}`\n```\n{message}\n```\nPlease check if the server at {server_url} is running."
    )
}
