//! Common test utilities for integration tests.

#![allow(dead_code)]

use ccweb_core::{SessionObserver, parse_jsonl};
use ccweb_types::{ClaudeEvent, DisplayMessage, PermissionDenial};
use std::path::PathBuf;

/// Read a fixture file from the fixtures directory.
pub fn load_fixture(name: &str) -> String {
    let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);

    std::fs::read_to_string(&fixture_path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", fixture_path.display(), e))
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a JSONL fixture as protocol events.
pub fn load_events(name: &str) -> Vec<ClaudeEvent> {
    parse_jsonl(&load_fixture(name))
}

/// Wrap a protocol event line in a `claude_json` stream frame.
pub fn claude_json_frame(event_line: &str) -> String {
    format!("{{\"type\":\"claude_json\",\"data\":{}}}\n", event_line.trim())
}

/// Serialize messages and sort them, for order-insensitive comparison.
pub fn sorted_json(messages: &[DisplayMessage]) -> Vec<String> {
    let mut out: Vec<String> = messages
        .iter()
        .map(|m| serde_json::to_string(m).unwrap())
        .collect();
    out.sort();
    out
}

/// Observer that records every callback.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub session_ids: Vec<String>,
    pub denials: Vec<PermissionDenial>,
    pub abort_requests: usize,
    pub init_shown: usize,
    pub hide_init: bool,
}

impl SessionObserver for RecordingObserver {
    fn on_session_id(&mut self, session_id: &str) {
        self.session_ids.push(session_id.to_string());
    }

    fn should_show_init_message(&self) -> bool {
        !self.hide_init
    }

    fn on_init_message_shown(&mut self) {
        self.init_shown += 1;
    }

    fn on_permission_error(&mut self, denial: &PermissionDenial) {
        self.denials.push(denial.clone());
    }

    fn on_abort_request(&mut self) {
        self.abort_requests += 1;
    }
}
