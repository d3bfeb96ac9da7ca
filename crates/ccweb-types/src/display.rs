//! Display message types produced for the chat UI.
//!
//! Every message carries a millisecond timestamp used only for display
//! ordering.

use serde::{Deserialize, Serialize};

use crate::Usage;

/// A UI-ready message in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DisplayMessage {
    /// User prompt or assistant prose.
    Chat {
        role: ChatRole,
        content: String,
        timestamp: i64,
    },
    /// System event such as `init`.
    System {
        subtype: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
        #[serde(default)]
        tools: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        permission_mode: Option<String>,
        timestamp: i64,
    },
    /// End-of-turn summary.
    Result {
        subtype: String,
        is_error: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        duration_ms: u64,
        total_cost_usd: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        num_turns: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
        timestamp: i64,
    },
    /// Stream-level error surfaced to the user.
    Error {
        subtype: String,
        message: String,
        timestamp: i64,
    },
    /// The request was aborted.
    Abort { message: String, timestamp: i64 },
    /// A tool invocation.
    Tool {
        tool_name: String,
        tool_use_id: String,
        content: String,
        timestamp: i64,
    },
    /// Output of a tool invocation.
    ToolResult {
        tool_name: String,
        tool_use_id: String,
        content: String,
        summary: String,
        is_error: bool,
        timestamp: i64,
    },
    /// Extended thinking trace.
    Thinking { content: String, timestamp: i64 },
    /// Snapshot of the assistant's todo list.
    Todo { todos: Vec<TodoItem>, timestamp: i64 },
    /// Plan proposed when leaving plan mode.
    Plan {
        plan: String,
        tool_use_id: String,
        timestamp: i64,
    },
}

impl DisplayMessage {
    pub fn timestamp(&self) -> i64 {
        match self {
            DisplayMessage::Chat { timestamp, .. }
            | DisplayMessage::System { timestamp, .. }
            | DisplayMessage::Result { timestamp, .. }
            | DisplayMessage::Error { timestamp, .. }
            | DisplayMessage::Abort { timestamp, .. }
            | DisplayMessage::Tool { timestamp, .. }
            | DisplayMessage::ToolResult { timestamp, .. }
            | DisplayMessage::Thinking { timestamp, .. }
            | DisplayMessage::Todo { timestamp, .. }
            | DisplayMessage::Plan { timestamp, .. } => *timestamp,
        }
    }

    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            DisplayMessage::Chat { .. } => "chat",
            DisplayMessage::System { .. } => "system",
            DisplayMessage::Result { .. } => "result",
            DisplayMessage::Error { .. } => "error",
            DisplayMessage::Abort { .. } => "abort",
            DisplayMessage::Tool { .. } => "tool",
            DisplayMessage::ToolResult { .. } => "tool_result",
            DisplayMessage::Thinking { .. } => "thinking",
            DisplayMessage::Todo { .. } => "todo",
            DisplayMessage::Plan { .. } => "plan",
        }
    }

    /// Text content for chat messages, `None` for everything else.
    pub fn chat_content(&self) -> Option<&str> {
        match self {
            DisplayMessage::Chat { content, .. } => Some(content),
            _ => None,
        }
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of a `TodoWrite` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub content: String,
    pub status: TodoStatus,
    pub active_form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

/// Signal raised when a tool invocation was denied for lack of permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDenial {
    pub tool_name: String,
    /// Candidate permission patterns, one per extracted command.
    pub patterns: Vec<String>,
    pub tool_use_id: String,
}
