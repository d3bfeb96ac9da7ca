//! Conversion of Claude CLI protocol events into UI-ready chat messages.
//!
//! Events arrive either live, as newline-delimited frames from the backend,
//! or replayed from persisted history. Both paths run through one
//! [`MessageProcessor`] and differ only in the [`EventSink`] strategy.

mod config;
mod error;
mod history;
pub mod messages;
mod parser;
mod processor;
mod sink;
mod streaming;
mod tool_cache;
pub mod tool_patterns;

pub use config::{ProcessorConfig, UnmatchedResultPolicy};
pub use error::CcwebError;
pub use history::{
    ConversationHistory, ConversationMetadata, HistoryConverter, parse_jsonl, parse_jsonl_strict,
};
pub use parser::FrameDecoder;
pub use processor::{MessageProcessor, NoopObserver, ProcessOptions, SessionObserver};
pub use sink::{CollectSink, EventSink, MergeSink, ProcessingMode, TranscriptChange};
pub use streaming::{StreamState, StreamingSession};
pub use tool_cache::{CachedToolUse, ToolUseCache};
pub use tool_patterns::{
    ToolInfo, extract_tool_info, generate_tool_patterns, permission_patterns,
};

/// Result type for ccweb operations.
pub type Result<T> = std::result::Result<T, CcwebError>;
