//! Decoder for the backend's newline-delimited stream frames.

use crate::{CcwebError, Result};
use ccweb_types::StreamFrame;
use tracing::debug;

const PREVIEW_CHARS: usize = 100;

/// Splits raw stream chunks into [`StreamFrame`]s.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Trailing partial line from the last chunk.
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one complete line, failing on blank or malformed input.
    pub fn parse_frame(line: &str) -> Result<StreamFrame> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(CcwebError::InvalidFrame("empty line".to_string()));
        }
        Ok(serde_json::from_str(trimmed)?)
    }

    /// Parse one line. Blank and malformed lines yield `None`.
    pub fn parse_line(&mut self, line: &str) -> Option<StreamFrame> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        match Self::parse_frame(trimmed) {
            Ok(frame) => Some(frame),
            Err(e) => {
                debug!(
                    target: "ccweb::parser",
                    "Failed to parse stream line: {}: {}",
                    e,
                    preview(trimmed)
                );
                None
            }
        }
    }

    /// Parse streaming data that may end in a partial line.
    pub fn parse_chunk(&mut self, chunk: &str) -> Vec<StreamFrame> {
        self.buffer.push_str(chunk);
        let mut frames = Vec::new();

        while let Some(newline_pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline_pos).collect();
            if let Some(frame) = self.parse_line(&line) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Parse whatever is left in the buffer as a final line.
    pub fn flush(&mut self) -> Option<StreamFrame> {
        let rest = std::mem::take(&mut self.buffer);
        self.parse_line(&rest)
    }

    /// Whether a partial line is waiting for more data.
    pub fn has_pending(&self) -> bool {
        !self.buffer.trim().is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

fn preview(line: &str) -> String {
    if line.chars().count() <= PREVIEW_CHARS {
        return line.to_string();
    }
    let mut out: String = line.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}
