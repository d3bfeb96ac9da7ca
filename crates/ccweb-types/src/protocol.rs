//! Claude CLI event types for stream-json output and persisted history.
//!
//! Matches the output of `claude -p --verbose --output-format stream-json`
//! and the JSONL transcripts Claude Code writes under `~/.claude/projects`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Events emitted by Claude CLI in stream-json mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeEvent {
    /// System event (`init` carries session metadata).
    System(SystemEvent),
    /// Assistant message with ordered content items.
    Assistant(AssistantEvent),
    /// User message (prompt text or tool results).
    User(UserEvent),
    /// Result/summary at the end of a turn.
    Result(ResultEvent),
    /// Any event type this client does not understand.
    #[serde(other)]
    Unknown,
}

impl ClaudeEvent {
    /// Creation time carried by the event itself (persisted history only).
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            ClaudeEvent::System(e) => e.timestamp,
            ClaudeEvent::Assistant(e) => e.timestamp,
            ClaudeEvent::User(e) => e.timestamp,
            ClaudeEvent::Result(e) => e.timestamp,
            ClaudeEvent::Unknown => None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            ClaudeEvent::System(e) => e.session_id.as_deref(),
            ClaudeEvent::Assistant(e) => e.session_id.as_deref(),
            ClaudeEvent::User(e) => e.session_id.as_deref(),
            ClaudeEvent::Result(e) => e.session_id.as_deref(),
            ClaudeEvent::Unknown => None,
        }
    }

    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            ClaudeEvent::System(_) => "system",
            ClaudeEvent::Assistant(_) => "assistant",
            ClaudeEvent::User(_) => "user",
            ClaudeEvent::Result(_) => "result",
            ClaudeEvent::Unknown => "unknown",
        }
    }

    /// Whether this is the `system`/`init` event that opens a request.
    pub fn is_init(&self) -> bool {
        matches!(self, ClaudeEvent::System(e) if e.subtype == "init")
    }
}

/// System event with subtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent {
    pub subtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(
        default,
        rename = "permissionMode",
        alias = "permission_mode",
        skip_serializing_if = "Option::is_none"
    )]
    pub permission_mode: Option<String>,
    #[serde(
        default,
        rename = "apiKeySource",
        alias = "api_key_source",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key_source: Option<String>,
    #[serde(
        default,
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
}

/// Assistant event containing the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantEvent {
    pub message: AssistantMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tool_use_id: Option<String>,
    #[serde(
        default,
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
}

/// The assistant's message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Content item in an assistant or user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Map<String, Value>,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
    Thinking {
        thinking: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    /// Item types such as images or redacted thinking.
    #[serde(other)]
    Unknown,
}

/// User message event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEvent {
    pub message: UserMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(
        default,
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub content: UserContent,
}

/// User content is either a bare prompt string or a list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    Text(String),
    Items(Vec<ContentItem>),
}

/// Result event at the end of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEvent {
    pub subtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_api_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_turns: Option<u32>,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(
        default,
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
}

/// Token usage for a message or a whole turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
}
