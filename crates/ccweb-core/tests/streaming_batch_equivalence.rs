//! Live streaming and history replay must agree on the same conversation.

mod common;

use ccweb_core::{
    MergeSink, MessageProcessor, ProcessOptions, StreamState, StreamingSession, parse_jsonl,
};
use common::{RecordingObserver, claude_json_frame, load_events, load_fixture, sorted_json};

// ==================== Fixture Shape ====================

#[test]
fn test_fixture_batch_output() {
    let events = load_events("conversation.jsonl");
    assert_eq!(events.len(), 12);

    let messages = MessageProcessor::new().process_messages_batch(&events);
    let kinds: Vec<&str> = messages.iter().map(|m| m.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "system",
            "chat",
            "thinking",
            "tool",
            "tool_result",
            "todo",
            "chat",
            "result",
            "plan",
            "tool",
            "tool_result",
            "chat",
            "result",
        ]
    );
    assert_eq!(messages[0].timestamp(), 1_736_503_200_000);
    assert_eq!(messages[12].timestamp(), 1_736_503_211_000);
}

// ==================== Equivalence ====================

#[test]
fn test_processor_modes_produce_same_messages() {
    let events = load_events("conversation.jsonl");

    let batch = MessageProcessor::new().process_messages_batch(&events);

    let mut processor = MessageProcessor::new();
    let mut sink = MergeSink::new();
    let mut observer = RecordingObserver::default();
    for event in &events {
        processor.process_message(event, ProcessOptions::default(), &mut sink, &mut observer);
    }
    let streamed = sink.into_messages();

    assert_eq!(streamed.len(), batch.len());
    assert_eq!(sorted_json(&streamed), sorted_json(&batch));
}

#[test]
fn test_whitespace_led_text_matches_batch() {
    let line = r#"{"type":"assistant","session_id":"s1","timestamp":5,"message":{"content":[{"type":"text","text":"\n\n"},{"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"/a.rs"}},{"type":"text","text":"Hi"}]}}"#;
    let blank = r#"{"type":"assistant","session_id":"s1","timestamp":6,"message":{"content":[{"type":"text","text":"  "}]}}"#;
    let events = parse_jsonl(&format!("{}\n{}\n", blank, line));
    let batch = MessageProcessor::new().process_messages_batch(&events);

    let mut session = StreamingSession::new(RecordingObserver::default());
    session.feed_chunk(&claude_json_frame(blank));
    session.feed_chunk(&claude_json_frame(line));

    assert_eq!(batch.len(), 2);
    assert_eq!(batch[1].chat_content(), Some("\n\nHi"));
    assert_eq!(batch[1].timestamp(), 5_000);
    assert_eq!(sorted_json(session.messages()), sorted_json(&batch));
}

#[test]
fn test_streaming_session_matches_batch() {
    let content = load_fixture("conversation.jsonl");
    let events = load_events("conversation.jsonl");
    let batch = MessageProcessor::new().process_messages_batch(&events);

    let mut session = StreamingSession::new(RecordingObserver::default());
    for line in content.lines() {
        session.feed_chunk(&claude_json_frame(line));
    }
    session.feed_chunk("{\"type\":\"done\"}\n");

    assert_eq!(session.state(), StreamState::Active);
    assert_eq!(session.observer().session_ids, vec!["sess-fixture"]);
    assert_eq!(session.observer().init_shown, 1);
    assert_eq!(sorted_json(session.messages()), sorted_json(&batch));
}

#[test]
fn test_arbitrary_chunking_matches_line_feeding() {
    let content = load_fixture("conversation.jsonl");
    let stream: String = content.lines().map(claude_json_frame).collect();

    let mut whole = StreamingSession::new(RecordingObserver::default());
    whole.feed_chunk(&stream);

    let mut chunked = StreamingSession::new(RecordingObserver::default());
    let chars: Vec<char> = stream.chars().collect();
    for piece in chars.chunks(17) {
        let piece: String = piece.iter().collect();
        chunked.feed_chunk(&piece);
    }

    assert_eq!(sorted_json(whole.messages()), sorted_json(chunked.messages()));
    assert_eq!(whole.messages().len(), 13);
}

#[test]
fn test_streaming_text_merges_within_turn() {
    let events = load_events("conversation.jsonl");
    let mut processor = MessageProcessor::new();
    let mut sink = MergeSink::new();
    let mut observer = RecordingObserver::default();

    for event in &events[..5] {
        processor.process_message(event, ProcessOptions::default(), &mut sink, &mut observer);
    }
    assert_eq!(
        sink.open_assistant().and_then(|m| m.chat_content()),
        Some("There are three files.")
    );

    processor.process_message(&events[6], ProcessOptions::default(), &mut sink, &mut observer);
    assert!(sink.open_assistant().is_none());
}
