mod common;

use ccweb_core::{
    HistoryConverter, MergeSink, MessageProcessor, ProcessOptions, ProcessorConfig,
    StreamingSession, UnmatchedResultPolicy,
};
use ccweb_types::{DisplayMessage, TodoStatus};
use common::{RecordingObserver, claude_json_frame, fixture_path, load_events};
use proptest::prelude::*;

// ==================== History Loading ====================

#[test]
fn test_load_fixture_conversation() {
    let history = HistoryConverter::new()
        .load_conversation(&fixture_path("conversation.jsonl"))
        .unwrap();

    assert_eq!(history.session_id.as_deref(), Some("sess-fixture"));
    assert_eq!(history.metadata.message_count, 13);
    assert_eq!(history.metadata.start_time, Some(1_736_503_200_000));
    assert_eq!(history.metadata.end_time, Some(1_736_503_211_000));
}

#[test]
fn test_fixture_message_details() {
    let messages = MessageProcessor::new().process_messages_batch(&load_events("conversation.jsonl"));

    match &messages[4] {
        DisplayMessage::ToolResult { tool_name, summary, .. } => {
            assert_eq!(tool_name, "Bash");
            assert_eq!(summary, "3 lines");
        }
        other => panic!("Expected Bash tool result, got {:?}", other),
    }

    match &messages[5] {
        DisplayMessage::Todo { todos, .. } => {
            assert_eq!(todos.len(), 2);
            assert_eq!(todos[0].status, TodoStatus::InProgress);
            assert_eq!(todos[0].active_form, "Inspecting files");
        }
        other => panic!("Expected todo message, got {:?}", other),
    }

    assert!(matches!(
        &messages[8],
        DisplayMessage::Plan { tool_use_id, .. } if tool_use_id == "toolu_3"
    ));
    assert!(matches!(
        &messages[10],
        DisplayMessage::ToolResult { tool_name, summary, .. }
            if tool_name == "Grep" && summary == "Found 12"
    ));
}

#[test]
fn test_sorted_replay_of_shuffled_events() {
    let mut events = load_events("conversation.jsonl");
    let in_order = MessageProcessor::new().process_messages_batch(&events);

    events.reverse();
    let sorted = HistoryConverter::new().sort_by_timestamp(true).convert(&events);
    assert_eq!(sorted, in_order);
}

#[test]
fn test_unmatched_result_dropped_by_config() {
    let events = load_events("conversation.jsonl");
    let config = ProcessorConfig {
        unmatched_tool_results: UnmatchedResultPolicy::Drop,
        ..ProcessorConfig::default()
    };

    // Without the Grep tool_use its result has nothing to correlate with
    let without_grep: Vec<_> = events
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 8)
        .map(|(_, e)| e.clone())
        .collect();

    let dropped = HistoryConverter::with_config(config).convert(&without_grep);
    assert_eq!(dropped.len(), 11);

    let placeholder = HistoryConverter::new().convert(&without_grep);
    assert!(placeholder.iter().any(|m| matches!(
        m,
        DisplayMessage::ToolResult { tool_name, .. } if tool_name == "Tool"
    )));
}

// ==================== Permission Denials ====================

const DENIED_TOOL_USE: &str = r#"{"type":"assistant","session_id":"s2","message":{"content":[{"type":"tool_use","id":"toolu_9","name":"Bash","input":{"command":"cd repo && npm install && git push"}}]}}"#;
const DENIED_RESULT: &str = r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"toolu_9","content":"Claude requested permissions to use Bash, but you haven't granted it yet.","is_error":true}]}}"#;

#[test]
fn test_permission_denial_in_stream() {
    let mut session = StreamingSession::new(RecordingObserver::default());
    session.feed_chunk(&claude_json_frame(
        r#"{"type":"system","subtype":"init","session_id":"s2"}"#,
    ));
    session.feed_chunk(&claude_json_frame(DENIED_TOOL_USE));
    session.feed_chunk(&claude_json_frame(DENIED_RESULT));
    session.feed_chunk("{\"type\":\"aborted\"}\n");

    let observer = session.observer();
    assert_eq!(observer.abort_requests, 1);
    assert_eq!(observer.denials.len(), 1);
    assert_eq!(
        observer.denials[0].patterns,
        vec!["Bash(npm install:*)", "Bash(git push:*)"]
    );

    let kinds: Vec<&str> = session.messages().iter().map(|m| m.kind()).collect();
    assert_eq!(kinds, vec!["system", "tool", "abort"]);
}

#[test]
fn test_permission_denial_hidden_in_history() {
    let events = ccweb_core::parse_jsonl(&format!("{}\n{}\n", DENIED_TOOL_USE, DENIED_RESULT));
    let messages = HistoryConverter::new().convert(&events);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind(), "tool");
}

#[test]
fn test_hidden_init_still_activates() {
    let observer = RecordingObserver {
        hide_init: true,
        ..RecordingObserver::default()
    };
    let mut processor = MessageProcessor::new();
    let mut sink = MergeSink::new();
    let mut observer = observer;
    let events = load_events("conversation.jsonl");

    processor.process_message(&events[0], ProcessOptions::default(), &mut sink, &mut observer);
    processor.process_message(&events[2], ProcessOptions::default(), &mut sink, &mut observer);

    assert!(processor.has_received_init());
    assert_eq!(observer.init_shown, 0);
    assert_eq!(observer.session_ids, vec!["sess-fixture"]);
    assert_eq!(sink.messages()[0].kind(), "thinking");
}

// ==================== Replay Properties ====================

proptest! {
    #[test]
    fn prop_replay_is_idempotent(take in 0usize..=12) {
        let events = load_events("conversation.jsonl");
        let prefix = &events[..take];
        let mut processor = MessageProcessor::new();

        let first = processor.process_messages_batch(prefix);
        let second = processor.process_messages_batch(prefix);
        prop_assert_eq!(&first, &second);

        let fresh = MessageProcessor::new().process_messages_batch(prefix);
        prop_assert_eq!(first, fresh);
    }
}
