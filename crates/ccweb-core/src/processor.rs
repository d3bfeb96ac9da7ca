//! Unified conversion of protocol events into display messages.
//!
//! One [`MessageProcessor`] serves both the live stream and history replay.
//! The [`EventSink`] passed in decides emission timing and target; the
//! processor itself only decides *what* each event produces.
//!
//! Per event:
//! - `system`: a system message (streaming `init` is gated by the observer)
//! - `assistant`: text, thinking, and one message per `tool_use`
//! - `user`: prompt text and correlated tool results
//! - `result`: a result message, closing the open assistant message

use crate::config::{ProcessorConfig, UnmatchedResultPolicy};
use crate::messages::{
    DEFAULT_TOOL, PLAN_EXIT_TOOL, TODO_TOOL, UNKNOWN_TOOL, chat_message, is_tool_execution_error,
    parse_todos, plan_message, resolve_timestamp, result_message, system_message,
    thinking_message, todo_message, tool_message, tool_result_content, tool_result_message,
};
use crate::sink::{CollectSink, EventSink, ProcessingMode};
use crate::tool_cache::ToolUseCache;
use crate::tool_patterns::permission_patterns;
use ccweb_types::{
    AssistantEvent, ChatRole, ClaudeEvent, ContentItem, DisplayMessage, PermissionDenial,
    ResultEvent, SystemEvent, UserContent, UserEvent,
};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Callbacks into the surrounding UI.
///
/// Every method has a no-op default, so collaborators implement only what
/// they care about.
pub trait SessionObserver {
    /// The session id became known. Called at most once per processor.
    fn on_session_id(&mut self, _session_id: &str) {}

    /// Whether a streaming `init` message should be displayed right now.
    fn should_show_init_message(&self) -> bool {
        true
    }

    fn on_init_message_shown(&mut self) {}

    /// A tool invocation was denied. Called at most once per invocation id.
    fn on_permission_error(&mut self, _denial: &PermissionDenial) {}

    /// The in-flight request should be aborted.
    fn on_abort_request(&mut self) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Per-call options.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessOptions {
    /// Overrides the event's own timestamp.
    pub timestamp: Option<i64>,
}

impl ProcessOptions {
    pub fn at(timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
        }
    }
}

/// Converts protocol events one at a time.
///
/// Owns the tool-use cache, so each concurrent session needs its own
/// processor.
#[derive(Debug, Default)]
pub struct MessageProcessor {
    config: ProcessorConfig,
    cache: ToolUseCache,
    init_received: bool,
    session_reported: bool,
    denied: HashSet<String>,
}

impl MessageProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProcessorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn cache(&self) -> &ToolUseCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Whether a streaming `init` event has been processed.
    pub fn has_received_init(&self) -> bool {
        self.init_received
    }

    /// Forget everything learned about the current session.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.init_received = false;
        self.session_reported = false;
        self.denied.clear();
    }

    /// Process one event, emitting its messages into `sink`.
    pub fn process_message(
        &mut self,
        event: &ClaudeEvent,
        options: ProcessOptions,
        sink: &mut dyn EventSink,
        observer: &mut dyn SessionObserver,
    ) {
        let timestamp = resolve_timestamp(options.timestamp, event.timestamp());

        match event {
            ClaudeEvent::System(system) => self.process_system(system, timestamp, sink, observer),
            ClaudeEvent::Assistant(assistant) => {
                self.process_assistant(assistant, timestamp, sink, observer)
            }
            ClaudeEvent::User(user) => self.process_user(user, timestamp, sink, observer),
            ClaudeEvent::Result(result) => self.process_result(result, timestamp, sink),
            ClaudeEvent::Unknown => {
                warn!(target: "ccweb::processor", "Skipping event with unrecognized type");
            }
        }

        sink.finish_event();
    }

    /// Replay persisted history into one ordered message list.
    ///
    /// Clears the tool-use cache first, so repeated replays of the same
    /// events produce identical output.
    pub fn process_messages_batch(&mut self, events: &[ClaudeEvent]) -> Vec<DisplayMessage> {
        self.cache.clear();
        let mut sink = CollectSink::new();
        let mut observer = NoopObserver;

        for event in events {
            self.process_message(event, ProcessOptions::default(), &mut sink, &mut observer);
        }

        let messages = sink.into_messages();
        debug!(
            target: "ccweb::processor",
            "Converted {} events into {} messages",
            events.len(),
            messages.len()
        );
        messages
    }

    fn process_system(
        &mut self,
        event: &SystemEvent,
        timestamp: i64,
        sink: &mut dyn EventSink,
        observer: &mut dyn SessionObserver,
    ) {
        if sink.mode() == ProcessingMode::Streaming && event.subtype == "init" {
            let show = observer.should_show_init_message();
            self.init_received = true;
            if show {
                sink.emit(system_message(event, timestamp));
                observer.on_init_message_shown();
            } else {
                debug!(target: "ccweb::processor", "Init message suppressed by observer");
            }
            return;
        }

        sink.emit(system_message(event, timestamp));
    }

    fn process_assistant(
        &mut self,
        event: &AssistantEvent,
        timestamp: i64,
        sink: &mut dyn EventSink,
        observer: &mut dyn SessionObserver,
    ) {
        if sink.mode() == ProcessingMode::Streaming {
            self.report_session_id(event.session_id.as_deref(), observer);
        }

        for item in &event.message.content {
            match item {
                ContentItem::Text { text } => sink.append_assistant_text(text, timestamp),
                ContentItem::ToolUse { id, name, input } => {
                    self.process_tool_use(id, name, input, timestamp, sink)
                }
                ContentItem::Thinking { thinking, .. } => {
                    sink.emit_thinking(thinking_message(thinking.as_str(), timestamp));
                }
                ContentItem::ToolResult { tool_use_id, .. } => {
                    debug!(
                        target: "ccweb::processor",
                        "Ignoring tool_result {} inside assistant event",
                        tool_use_id
                    );
                }
                ContentItem::Unknown => {
                    debug!(target: "ccweb::processor", "Skipping unknown assistant content item");
                }
            }
        }
    }

    fn process_tool_use(
        &mut self,
        id: &str,
        name: &str,
        input: &Map<String, Value>,
        timestamp: i64,
        sink: &mut dyn EventSink,
    ) {
        self.cache.insert(id, name, input.clone());

        if name == PLAN_EXIT_TOOL {
            sink.emit(plan_message(id, input, timestamp));
            return;
        }

        if name == TODO_TOOL {
            if let Some(todos) = parse_todos(input) {
                sink.emit(todo_message(todos, timestamp));
                return;
            }
            debug!(
                target: "ccweb::processor",
                "Malformed {} input for {}, showing generic tool message",
                TODO_TOOL,
                id
            );
        }

        sink.emit(tool_message(
            id,
            name,
            input,
            self.config.tool_display_max_len,
            timestamp,
        ));
    }

    fn process_user(
        &mut self,
        event: &UserEvent,
        timestamp: i64,
        sink: &mut dyn EventSink,
        observer: &mut dyn SessionObserver,
    ) {
        match &event.message.content {
            UserContent::Text(text) => {
                if !text.trim().is_empty() {
                    sink.emit(chat_message(ChatRole::User, text.as_str(), timestamp));
                }
            }
            UserContent::Items(items) => {
                for item in items {
                    match item {
                        ContentItem::ToolResult {
                            tool_use_id,
                            content,
                            is_error,
                        } => self.process_tool_result(
                            tool_use_id,
                            content,
                            *is_error,
                            timestamp,
                            sink,
                            observer,
                        ),
                        ContentItem::Text { text } => {
                            if !text.trim().is_empty() {
                                sink.emit(chat_message(ChatRole::User, text.as_str(), timestamp));
                            }
                        }
                        _ => {
                            debug!(target: "ccweb::processor", "Skipping non-text user content item");
                        }
                    }
                }
            }
        }
    }

    fn process_tool_result(
        &mut self,
        tool_use_id: &str,
        content: &Value,
        is_error: bool,
        timestamp: i64,
        sink: &mut dyn EventSink,
        observer: &mut dyn SessionObserver,
    ) {
        let text = tool_result_content(content);

        if is_error && !is_tool_execution_error(&text) {
            self.report_permission_denial(tool_use_id, observer);
            return;
        }

        if self.cache.get(tool_use_id).is_none()
            && self.config.unmatched_tool_results == UnmatchedResultPolicy::Drop
        {
            debug!(
                target: "ccweb::processor",
                "Dropping tool_result {} with no matching tool_use",
                tool_use_id
            );
            return;
        }
        let tool_name = self.cache.resolve_name(tool_use_id, DEFAULT_TOOL);

        // The todo list was already shown from its tool_use
        if tool_name == TODO_TOOL {
            return;
        }

        sink.emit(tool_result_message(
            tool_name,
            tool_use_id,
            &text,
            is_error,
            self.config.summary_char_threshold,
            timestamp,
        ));
    }

    fn report_permission_denial(&mut self, tool_use_id: &str, observer: &mut dyn SessionObserver) {
        if !self.denied.insert(tool_use_id.to_string()) {
            debug!(
                target: "ccweb::processor",
                "Permission denial for {} already reported",
                tool_use_id
            );
            return;
        }

        let (tool_name, input) = match self.cache.get(tool_use_id) {
            Some(cached) => (cached.name.clone(), cached.input.clone()),
            None => (UNKNOWN_TOOL.to_string(), Map::new()),
        };
        let patterns = permission_patterns(&tool_name, &input);

        info!(
            target: "ccweb::processor",
            "Permission denied for {} ({}), patterns: {:?}",
            tool_name,
            tool_use_id,
            patterns
        );

        observer.on_abort_request();
        observer.on_permission_error(&PermissionDenial {
            tool_name,
            patterns,
            tool_use_id: tool_use_id.to_string(),
        });
    }

    fn process_result(&mut self, event: &ResultEvent, timestamp: i64, sink: &mut dyn EventSink) {
        sink.emit(result_message(event, timestamp));
        sink.close_assistant_message();
    }

    fn report_session_id(&mut self, session_id: Option<&str>, observer: &mut dyn SessionObserver) {
        if self.session_reported || !self.init_received {
            return;
        }
        if let Some(id) = session_id.filter(|id| !id.is_empty()) {
            self.session_reported = true;
            info!(target: "ccweb::processor", "Session id: {}", id);
            observer.on_session_id(id);
        }
    }
}
