//! Correlation of tool results with the invocations that produced them.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// What was recorded when a `tool_use` item was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedToolUse {
    pub name: String,
    pub input: Map<String, Value>,
}

/// Tool invocations seen so far in one session or one batch replay.
///
/// Owned by exactly one processor; entries are read, never removed, when a
/// result arrives, and the whole cache is dropped with [`clear`](Self::clear).
#[derive(Debug, Default, Clone)]
pub struct ToolUseCache {
    entries: HashMap<String, CachedToolUse>,
}

impl ToolUseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invocation. A repeated id replaces the earlier entry.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>, input: Map<String, Value>) {
        self.entries.insert(
            id.into(),
            CachedToolUse {
                name: name.into(),
                input,
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<&CachedToolUse> {
        self.entries.get(id)
    }

    /// Tool name for `id`, or `default` when the invocation was never seen.
    pub fn resolve_name<'a>(&'a self, id: &str, default: &'a str) -> &'a str {
        self.entries.get(id).map(|e| e.name.as_str()).unwrap_or(default)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
