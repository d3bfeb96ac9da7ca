//! Constructors turning protocol content into display messages.

use ccweb_types::{ChatRole, DisplayMessage, ResultEvent, SystemEvent, TodoItem};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Tool that updates the assistant's todo list.
pub const TODO_TOOL: &str = "TodoWrite";
/// Tool signalling the assistant is proposing a plan instead of acting.
pub const PLAN_EXIT_TOOL: &str = "ExitPlanMode";
/// Marker Claude CLI puts around tool execution failures.
pub const TOOL_ERROR_MARKER: &str = "<tool_use_error>";
/// Tool name used for a denied invocation with no recorded `tool_use`.
pub const UNKNOWN_TOOL: &str = "Unknown";
/// Tool name used for a result with no recorded `tool_use`.
pub const DEFAULT_TOOL: &str = "Tool";

static FOUND_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bFound (\d+)").unwrap());
static FILES_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d+) files?\b").unwrap());

/// Get current time in milliseconds since Unix epoch.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Caller override first, then the event's own timestamp, then the clock.
pub fn resolve_timestamp(override_ts: Option<i64>, event_ts: Option<i64>) -> i64 {
    override_ts.or(event_ts).unwrap_or_else(now_ms)
}

pub fn chat_message(role: ChatRole, content: impl Into<String>, timestamp: i64) -> DisplayMessage {
    DisplayMessage::Chat {
        role,
        content: content.into(),
        timestamp,
    }
}

pub fn system_message(event: &SystemEvent, timestamp: i64) -> DisplayMessage {
    DisplayMessage::System {
        subtype: event.subtype.clone(),
        model: event.model.clone(),
        session_id: event.session_id.clone(),
        cwd: event.cwd.clone(),
        tools: event.tools.clone(),
        permission_mode: event.permission_mode.clone(),
        timestamp,
    }
}

pub fn result_message(event: &ResultEvent, timestamp: i64) -> DisplayMessage {
    DisplayMessage::Result {
        subtype: event.subtype.clone(),
        is_error: event.is_error,
        result: event.result.clone(),
        duration_ms: event.duration_ms,
        total_cost_usd: event.total_cost_usd,
        num_turns: event.num_turns,
        usage: event.usage.clone(),
        timestamp,
    }
}

pub fn error_message(message: impl Into<String>, timestamp: i64) -> DisplayMessage {
    DisplayMessage::Error {
        subtype: "stream_error".to_string(),
        message: message.into(),
        timestamp,
    }
}

pub fn abort_message(timestamp: i64) -> DisplayMessage {
    DisplayMessage::Abort {
        message: "Operation was aborted by user".to_string(),
        timestamp,
    }
}

pub fn thinking_message(content: impl Into<String>, timestamp: i64) -> DisplayMessage {
    DisplayMessage::Thinking {
        content: content.into(),
        timestamp,
    }
}

/// Generic tool invocation display, e.g. `Bash(cargo test)`.
pub fn tool_message(
    tool_use_id: &str,
    tool_name: &str,
    input: &Map<String, Value>,
    max_len: usize,
    timestamp: i64,
) -> DisplayMessage {
    let display = tool_display(tool_name, input, max_len);
    let content = if display.is_empty() {
        tool_name.to_string()
    } else {
        format!("{}({})", tool_name, display)
    };

    DisplayMessage::Tool {
        tool_name: tool_name.to_string(),
        tool_use_id: tool_use_id.to_string(),
        content,
        timestamp,
    }
}

/// Short display of the argument that best describes a tool call.
pub fn tool_display(tool_name: &str, input: &Map<String, Value>, max_len: usize) -> String {
    let key = match tool_name {
        "Bash" => Some("command"),
        "Read" | "Write" | "Edit" | "MultiEdit" => Some("file_path"),
        "NotebookEdit" => Some("notebook_path"),
        "Glob" | "Grep" => Some("pattern"),
        "WebFetch" => Some("url"),
        "WebSearch" => Some("query"),
        "Task" => Some("description"),
        "LS" => Some("path"),
        _ => None,
    };

    let value = key
        .and_then(|k| input.get(k))
        .and_then(Value::as_str)
        .or_else(|| input.values().find_map(Value::as_str))
        .unwrap_or("");

    truncate(value.trim(), max_len)
}

/// Truncate to `max_len` characters, ending with `...` when cut.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Flatten tool result content into display text.
///
/// Strings pass through, arrays of text blocks are joined by newlines, and
/// anything else is JSON-encoded.
pub fn tool_result_content(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                Value::String(s) => Some(s.as_str()),
                other => other
                    .get("type")
                    .and_then(Value::as_str)
                    .filter(|t| *t == "text")
                    .and_then(|_| other.get("text"))
                    .and_then(Value::as_str),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// One-line summary of tool output. First matching rule wins.
pub fn summarize_tool_result(content: &str, threshold: usize) -> String {
    let lines = content.lines().filter(|l| !l.trim().is_empty()).count();
    if lines > 1 {
        return format!("{} lines", lines);
    }

    if let Some(caps) = FOUND_REGEX.captures(content) {
        return format!("Found {}", &caps[1]);
    }

    if let Some(caps) = FILES_REGEX.captures(content) {
        return format!("{} files", &caps[1]);
    }

    let chars = content.chars().count();
    if chars < threshold {
        return content.trim().to_string();
    }

    format!("{} chars", chars)
}

pub fn tool_result_message(
    tool_name: &str,
    tool_use_id: &str,
    content: &str,
    is_error: bool,
    summary_threshold: usize,
    timestamp: i64,
) -> DisplayMessage {
    DisplayMessage::ToolResult {
        tool_name: tool_name.to_string(),
        tool_use_id: tool_use_id.to_string(),
        content: content.to_string(),
        summary: summarize_tool_result(content, summary_threshold),
        is_error,
        timestamp,
    }
}

/// Whether an error result is a tool execution failure rather than a
/// permission denial.
pub fn is_tool_execution_error(content: &str) -> bool {
    content.contains(TOOL_ERROR_MARKER)
}

/// Parse `TodoWrite` input. Every item needs content, a known status and an
/// active form, otherwise the whole list is rejected.
pub fn parse_todos(input: &Map<String, Value>) -> Option<Vec<TodoItem>> {
    let todos = input.get("todos")?.as_array()?;
    todos
        .iter()
        .map(|item| serde_json::from_value::<TodoItem>(item.clone()).ok())
        .collect()
}

pub fn todo_message(todos: Vec<TodoItem>, timestamp: i64) -> DisplayMessage {
    DisplayMessage::Todo { todos, timestamp }
}

pub fn plan_message(tool_use_id: &str, input: &Map<String, Value>, timestamp: i64) -> DisplayMessage {
    let plan = input
        .get("plan")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    DisplayMessage::Plan {
        plan,
        tool_use_id: tool_use_id.to_string(),
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccweb_types::TodoStatus;
    use serde_json::json;

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    // ==================== Summary Tests ====================

    #[test]
    fn test_summary_multi_line() {
        assert_eq!(summarize_tool_result("a\nb\nc", 50), "3 lines");
        assert_eq!(summarize_tool_result("a\n\nb\n", 50), "2 lines");
    }

    #[test]
    fn test_summary_found() {
        assert_eq!(summarize_tool_result("Found 12 matches", 50), "Found 12");
    }

    #[test]
    fn test_summary_files() {
        assert_eq!(summarize_tool_result("Listed 7 files in src", 50), "7 files");
    }

    #[test]
    fn test_summary_short_content_is_trimmed() {
        assert_eq!(summarize_tool_result("  ok  ", 50), "ok");
        assert_eq!(summarize_tool_result("", 50), "");
    }

    #[test]
    fn test_summary_char_count() {
        let content = "x".repeat(500);
        assert_eq!(summarize_tool_result(&content, 50), "500 chars");

        let content = "é".repeat(60);
        assert_eq!(summarize_tool_result(&content, 50), "60 chars");
    }

    #[test]
    fn test_summary_rule_order() {
        // Multi-line wins over Found.
        assert_eq!(summarize_tool_result("Found 2 matches\na\nb", 50), "3 lines");
        // Found wins over files.
        assert_eq!(summarize_tool_result("Found 3 files", 50), "Found 3");
    }

    // ==================== Tool Display Tests ====================

    #[test]
    fn test_tool_message_bash() {
        let msg = tool_message("toolu_1", "Bash", &input(json!({"command": "cargo test"})), 60, 1);
        assert_eq!(
            msg,
            DisplayMessage::Tool {
                tool_name: "Bash".into(),
                tool_use_id: "toolu_1".into(),
                content: "Bash(cargo test)".into(),
                timestamp: 1,
            }
        );
    }

    #[test]
    fn test_tool_display_known_keys() {
        assert_eq!(
            tool_display("Read", &input(json!({"offset": 3, "file_path": "/src/main.rs"})), 60),
            "/src/main.rs"
        );
        assert_eq!(tool_display("Grep", &input(json!({"pattern": "fn main"})), 60), "fn main");
        assert_eq!(tool_display("WebSearch", &input(json!({"query": "rust"})), 60), "rust");
    }

    #[test]
    fn test_tool_display_fallback_and_empty() {
        assert_eq!(
            tool_display("mcp__db__query", &input(json!({"limit": 5, "sql": "select 1"})), 60),
            "select 1"
        );
        let msg = tool_message("t", "Custom", &Map::new(), 60, 1);
        assert!(matches!(msg, DisplayMessage::Tool { content, .. } if content == "Custom"));
    }

    #[test]
    fn test_tool_display_truncation() {
        let long = "a".repeat(100);
        let display = tool_display("Bash", &input(json!({"command": long})), 20);
        assert_eq!(display.chars().count(), 20);
        assert!(display.ends_with("..."));

        let multibyte = "ü".repeat(30);
        let display = tool_display("Bash", &input(json!({"command": multibyte})), 10);
        assert_eq!(display, format!("{}...", "ü".repeat(7)));
    }

    // ==================== Tool Result Content Tests ====================

    #[test]
    fn test_tool_result_content_shapes() {
        assert_eq!(tool_result_content(&json!("plain")), "plain");
        assert_eq!(tool_result_content(&Value::Null), "");
        assert_eq!(
            tool_result_content(&json!([
                {"type": "text", "text": "one"},
                {"type": "image", "source": {}},
                {"type": "text", "text": "two"}
            ])),
            "one\ntwo"
        );
        assert_eq!(tool_result_content(&json!({"ok": true})), r#"{"ok":true}"#);
    }

    #[test]
    fn test_tool_execution_error_marker() {
        assert!(is_tool_execution_error(
            "<tool_use_error>File does not exist.</tool_use_error>"
        ));
        assert!(!is_tool_execution_error(
            "Claude requested permissions to use Bash, but you haven't granted it yet."
        ));
    }

    // ==================== Todo / Plan Tests ====================

    #[test]
    fn test_parse_todos_valid() {
        let todos = parse_todos(&input(json!({"todos": [
            {"content": "Write code", "status": "completed", "activeForm": "Writing code"},
            {"content": "Test", "status": "pending", "activeForm": "Testing", "id": "2"}
        ]})))
        .unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].status, TodoStatus::Completed);
        assert_eq!(todos[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_parse_todos_rejects_malformed_items() {
        assert!(parse_todos(&input(json!({"todos": [
            {"content": "Write code", "status": "completed", "activeForm": "Writing code"},
            {"content": "Missing form", "status": "pending"}
        ]})))
        .is_none());
        assert!(parse_todos(&input(json!({"todos": [
            {"content": "x", "status": "done", "activeForm": "x"}
        ]})))
        .is_none());
        assert!(parse_todos(&input(json!({"todos": "nope"}))).is_none());
        assert!(parse_todos(&Map::new()).is_none());
    }

    #[test]
    fn test_parse_todos_empty_list() {
        assert_eq!(parse_todos(&input(json!({"todos": []}))), Some(Vec::new()));
    }

    #[test]
    fn test_plan_message() {
        let msg = plan_message("toolu_9", &input(json!({"plan": "1. Refactor"})), 5);
        assert_eq!(
            msg,
            DisplayMessage::Plan {
                plan: "1. Refactor".into(),
                tool_use_id: "toolu_9".into(),
                timestamp: 5,
            }
        );
    }

    #[test]
    fn test_resolve_timestamp_precedence() {
        assert_eq!(resolve_timestamp(Some(1), Some(2)), 1);
        assert_eq!(resolve_timestamp(None, Some(2)), 2);
        assert!(resolve_timestamp(None, None) > 1_600_000_000_000);
    }
}
