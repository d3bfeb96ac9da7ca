//! Emission strategies for processed messages.
//!
//! The processor never branches on "streaming or not" when emitting. It
//! hands every message to an [`EventSink`], and the sink decides whether the
//! message lands in a live transcript ([`MergeSink`]) or in an ordered
//! replay list ([`CollectSink`]).

use crate::messages::chat_message;
use ccweb_types::{ChatRole, DisplayMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Live stream: messages appear as soon as they are seen.
    Streaming,
    /// History replay: one complete message list.
    Batch,
}

/// Destination for the messages of one processed event.
pub trait EventSink {
    fn mode(&self) -> ProcessingMode;

    /// Emit a tool, result, system or user message.
    fn emit(&mut self, message: DisplayMessage);

    /// Emit a thinking trace.
    fn emit_thinking(&mut self, message: DisplayMessage);

    /// Add free assistant text.
    fn append_assistant_text(&mut self, text: &str, timestamp: i64);

    /// Called once after every event.
    fn finish_event(&mut self);

    /// Close the open assistant message (a turn ended or was aborted).
    fn close_assistant_message(&mut self);
}

/// A change to a live transcript, for the UI to re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptChange {
    /// A message was appended at this index.
    Added(usize),
    /// The message at this index got more content.
    Updated(usize),
}

impl TranscriptChange {
    pub fn index(&self) -> usize {
        match self {
            TranscriptChange::Added(i) | TranscriptChange::Updated(i) => *i,
        }
    }
}

/// Streaming strategy: merges assistant text into one growing message.
#[derive(Debug, Default)]
pub struct MergeSink {
    messages: Vec<DisplayMessage>,
    /// Index of the assistant chat message still receiving text.
    open_assistant: Option<usize>,
    /// Whitespace seen in this event before any message was opened.
    leading_whitespace: String,
    leading_timestamp: Option<i64>,
    changes: Vec<TranscriptChange>,
}

impl MergeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<DisplayMessage> {
        self.messages
    }

    /// The assistant message currently receiving text, if any.
    pub fn open_assistant(&self) -> Option<&DisplayMessage> {
        self.open_assistant.and_then(|i| self.messages.get(i))
    }

    /// Take the changes recorded since the last call.
    pub fn drain_changes(&mut self) -> Vec<TranscriptChange> {
        std::mem::take(&mut self.changes)
    }

    fn push(&mut self, message: DisplayMessage) {
        self.messages.push(message);
        self.changes.push(TranscriptChange::Added(self.messages.len() - 1));
    }
}

impl EventSink for MergeSink {
    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Streaming
    }

    fn emit(&mut self, message: DisplayMessage) {
        self.push(message);
    }

    fn emit_thinking(&mut self, message: DisplayMessage) {
        self.push(message);
    }

    fn append_assistant_text(&mut self, text: &str, timestamp: i64) {
        if let Some(index) = self.open_assistant {
            if let Some(DisplayMessage::Chat { content, .. }) = self.messages.get_mut(index) {
                content.push_str(text);
                self.changes.push(TranscriptChange::Updated(index));
                return;
            }
        }

        // Whitespace alone never opens a message; it is held until real text
        // arrives in the same event
        if text.trim().is_empty() {
            self.leading_whitespace.push_str(text);
            self.leading_timestamp.get_or_insert(timestamp);
            return;
        }

        let mut content = std::mem::take(&mut self.leading_whitespace);
        content.push_str(text);
        let timestamp = self.leading_timestamp.take().unwrap_or(timestamp);
        self.push(chat_message(ChatRole::Assistant, content, timestamp));
        self.open_assistant = Some(self.messages.len() - 1);
    }

    fn finish_event(&mut self) {
        self.leading_whitespace.clear();
        self.leading_timestamp = None;
    }

    fn close_assistant_message(&mut self) {
        self.open_assistant = None;
        self.leading_whitespace.clear();
        self.leading_timestamp = None;
    }
}

/// Batch strategy: collects one ordered list.
///
/// Within an event, thinking traces come first, then tool and other
/// messages, then the accumulated assistant text.
#[derive(Debug, Default)]
pub struct CollectSink {
    messages: Vec<DisplayMessage>,
    thinking: Vec<DisplayMessage>,
    pending: Vec<DisplayMessage>,
    text: String,
    text_timestamp: Option<i64>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn into_messages(mut self) -> Vec<DisplayMessage> {
        self.finish_event();
        self.messages
    }
}

impl EventSink for CollectSink {
    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Batch
    }

    fn emit(&mut self, message: DisplayMessage) {
        self.pending.push(message);
    }

    fn emit_thinking(&mut self, message: DisplayMessage) {
        self.thinking.push(message);
    }

    fn append_assistant_text(&mut self, text: &str, timestamp: i64) {
        self.text.push_str(text);
        self.text_timestamp.get_or_insert(timestamp);
    }

    fn finish_event(&mut self) {
        self.messages.append(&mut self.thinking);
        self.messages.append(&mut self.pending);

        let text = std::mem::take(&mut self.text);
        if let Some(timestamp) = self.text_timestamp.take() {
            if !text.trim().is_empty() {
                self.messages
                    .push(chat_message(ChatRole::Assistant, text, timestamp));
            }
        }
    }

    fn close_assistant_message(&mut self) {}
}
