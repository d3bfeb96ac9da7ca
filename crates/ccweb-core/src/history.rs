//! Conversion of persisted conversation history into display messages.

use crate::config::ProcessorConfig;
use crate::processor::MessageProcessor;
use crate::{CcwebError, Result};
use ccweb_types::{ClaudeEvent, DisplayMessage};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// A loaded conversation, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationHistory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub messages: Vec<DisplayMessage>,
    pub metadata: ConversationMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    pub message_count: usize,
}

/// Replays history through a batch-mode [`MessageProcessor`].
#[derive(Debug, Default)]
pub struct HistoryConverter {
    processor: MessageProcessor,
    sort_by_timestamp: bool,
    strict: bool,
}

impl HistoryConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProcessorConfig) -> Self {
        Self {
            processor: MessageProcessor::with_config(config),
            sort_by_timestamp: false,
            strict: false,
        }
    }

    /// Order events by their own timestamps before converting.
    ///
    /// The sort is stable. An event without a timestamp keeps the position
    /// of the event before it.
    pub fn sort_by_timestamp(mut self, sort: bool) -> Self {
        self.sort_by_timestamp = sort;
        self
    }

    /// Fail on the first malformed line instead of skipping it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn convert(&mut self, events: &[ClaudeEvent]) -> Vec<DisplayMessage> {
        if !self.sort_by_timestamp {
            return self.processor.process_messages_batch(events);
        }

        let mut last = i64::MIN;
        let mut keyed: Vec<(i64, &ClaudeEvent)> = events
            .iter()
            .map(|event| {
                if let Some(ts) = event.timestamp() {
                    last = ts;
                }
                (last, event)
            })
            .collect();
        keyed.sort_by_key(|(ts, _)| *ts);

        let sorted: Vec<ClaudeEvent> = keyed.into_iter().map(|(_, e)| e.clone()).collect();
        self.processor.process_messages_batch(&sorted)
    }

    /// Convert JSONL text, skipping lines that do not parse.
    pub fn convert_jsonl(&mut self, content: &str) -> Vec<DisplayMessage> {
        let events = parse_jsonl(content);
        self.convert(&events)
    }

    /// Read a JSONL history file and convert it.
    pub fn load_file(&mut self, path: &Path) -> Result<Vec<DisplayMessage>> {
        let events = self.read_events(path)?;
        Ok(self.convert(&events))
    }

    /// Load and convert a JSONL conversation file, with summary metadata.
    pub fn load_conversation(&mut self, path: &Path) -> Result<ConversationHistory> {
        let events = self.read_events(path)?;
        let session_id = events
            .iter()
            .find_map(|e| e.session_id().map(str::to_string));
        let messages = self.convert(&events);

        debug!(
            target: "ccweb::history",
            "Loaded {} messages from {}",
            messages.len(),
            path.display()
        );

        let metadata = ConversationMetadata {
            start_time: messages.iter().map(DisplayMessage::timestamp).min(),
            end_time: messages.iter().map(DisplayMessage::timestamp).max(),
            message_count: messages.len(),
        };

        Ok(ConversationHistory {
            session_id,
            messages,
            metadata,
        })
    }

    fn read_events(&self, path: &Path) -> Result<Vec<ClaudeEvent>> {
        let content = std::fs::read_to_string(path)?;
        if self.strict {
            parse_jsonl_strict(&content)
        } else {
            Ok(parse_jsonl(&content))
        }
    }
}

/// Parse JSONL into events. Blank lines are ignored; malformed lines are
/// logged and skipped.
pub fn parse_jsonl(content: &str) -> Vec<ClaudeEvent> {
    let mut events = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ClaudeEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(
                    target: "ccweb::history",
                    "Skipping malformed history line {}: {}",
                    index + 1,
                    e
                );
            }
        }
    }
    events
}

/// Like [`parse_jsonl`], but the first malformed line is an error.
pub fn parse_jsonl_strict(content: &str) -> Result<Vec<ClaudeEvent>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<ClaudeEvent>(line.trim()).map_err(|source| {
                CcwebError::ParseError {
                    line: index + 1,
                    source,
                }
            })
        })
        .collect()
}
