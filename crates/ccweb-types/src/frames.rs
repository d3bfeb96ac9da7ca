//! Transport frames of the newline-delimited chat stream.

use serde::{Deserialize, Serialize};

use crate::ClaudeEvent;

/// One line of the chat stream delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    /// A protocol event forwarded from the Claude CLI.
    ClaudeJson { data: ClaudeEvent },
    /// Backend-side failure while producing the stream.
    Error { error: String },
    /// The request was aborted.
    Aborted,
    /// The backend finished the response.
    Done,
}
