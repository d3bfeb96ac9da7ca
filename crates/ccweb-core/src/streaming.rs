//! Live transcript built from the backend's chat stream.

use crate::config::ProcessorConfig;
use crate::messages::{abort_message, error_message, now_ms};
use crate::parser::FrameDecoder;
use crate::processor::{MessageProcessor, ProcessOptions, SessionObserver};
use crate::sink::{EventSink, MergeSink, TranscriptChange};
use crate::Result;
use ccweb_types::{DisplayMessage, PermissionDenial, StreamFrame};
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

/// Where a streaming request currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No `init` event seen yet for this request.
    WaitingForInit,
    /// Receiving events.
    Active,
    /// Aborted; frames are ignored until [`StreamingSession::restart`].
    Aborted,
}

/// One chat session's live transcript.
pub struct StreamingSession<O: SessionObserver> {
    processor: MessageProcessor,
    sink: MergeSink,
    decoder: FrameDecoder,
    observer: O,
    state: StreamState,
}

impl<O: SessionObserver> StreamingSession<O> {
    pub fn new(observer: O) -> Self {
        Self::with_config(ProcessorConfig::default(), observer)
    }

    pub fn with_config(config: ProcessorConfig, observer: O) -> Self {
        Self {
            processor: MessageProcessor::with_config(config),
            sink: MergeSink::new(),
            decoder: FrameDecoder::new(),
            observer,
            state: StreamState::WaitingForInit,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        self.sink.messages()
    }

    pub fn into_messages(self) -> Vec<DisplayMessage> {
        self.sink.into_messages()
    }

    /// The assistant message still receiving text, if any.
    pub fn current_assistant_message(&self) -> Option<&DisplayMessage> {
        self.sink.open_assistant()
    }

    pub fn processor(&self) -> &MessageProcessor {
        &self.processor
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Feed raw stream data, which may split lines anywhere.
    pub fn feed_chunk(&mut self, chunk: &str) -> Vec<TranscriptChange> {
        let frames = self.decoder.parse_chunk(chunk);
        let mut changes = Vec::new();
        for frame in &frames {
            changes.extend(self.handle_frame(frame));
        }
        changes
    }

    /// Feed one complete line.
    pub fn feed_line(&mut self, line: &str) -> Vec<TranscriptChange> {
        match self.decoder.parse_line(line) {
            Some(frame) => self.handle_frame(&frame),
            None => Vec::new(),
        }
    }

    /// Process the trailing partial line, if any, at end of stream.
    pub fn finish(&mut self) -> Vec<TranscriptChange> {
        if self.decoder.has_pending() {
            debug!(target: "ccweb::stream", "Flushing unterminated final line");
        }
        match self.decoder.flush() {
            Some(frame) => self.handle_frame(&frame),
            None => Vec::new(),
        }
    }

    pub fn handle_frame(&mut self, frame: &StreamFrame) -> Vec<TranscriptChange> {
        if self.state == StreamState::Aborted {
            debug!(target: "ccweb::stream", "Dropping frame received after abort");
            return Vec::new();
        }

        match frame {
            StreamFrame::ClaudeJson { data } => {
                let mut observer = AbortWatch::new(&mut self.observer);
                self.processor.process_message(
                    data,
                    ProcessOptions::default(),
                    &mut self.sink,
                    &mut observer,
                );
                let abort_requested = observer.abort_requested;

                if data.is_init() && self.state == StreamState::WaitingForInit {
                    self.state = StreamState::Active;
                }
                if abort_requested {
                    info!(target: "ccweb::stream", "Aborting request after permission denial");
                    self.mark_aborted();
                }
            }
            StreamFrame::Error { error } => {
                warn!(target: "ccweb::stream", "Stream error: {}", error);
                self.sink.emit(error_message(error.as_str(), now_ms()));
            }
            StreamFrame::Aborted => self.mark_aborted(),
            StreamFrame::Done => {
                debug!(target: "ccweb::stream", "Stream done");
            }
        }

        self.sink.drain_changes()
    }

    /// Abort the current request from this side.
    pub fn abort(&mut self) -> Vec<TranscriptChange> {
        if self.state == StreamState::Aborted {
            return Vec::new();
        }
        self.mark_aborted();
        self.sink.drain_changes()
    }

    /// Prepare for the next request in the same session.
    ///
    /// The transcript and tool-use cache are kept.
    pub fn restart(&mut self) {
        self.decoder.reset();
        self.sink.close_assistant_message();
        self.state = StreamState::WaitingForInit;
    }

    /// Consume a stream of text chunks, reporting every transcript change.
    ///
    /// Chunks may split lines anywhere. Stops early once the request is
    /// aborted.
    pub async fn run<S, F>(&mut self, chunks: S, mut on_change: F) -> Result<()>
    where
        S: Stream<Item = std::io::Result<String>>,
        F: FnMut(TranscriptChange, &DisplayMessage),
    {
        futures::pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            let changes = self.feed_chunk(&chunk?);
            self.notify(&changes, &mut on_change);
            if self.state == StreamState::Aborted {
                info!(target: "ccweb::stream", "Request aborted, stopping stream");
                break;
            }
        }

        let changes = self.finish();
        self.notify(&changes, &mut on_change);
        Ok(())
    }

    fn notify<F>(&self, changes: &[TranscriptChange], on_change: &mut F)
    where
        F: FnMut(TranscriptChange, &DisplayMessage),
    {
        for change in changes {
            if let Some(message) = self.sink.messages().get(change.index()) {
                on_change(*change, message);
            }
        }
    }

    fn mark_aborted(&mut self) {
        info!(target: "ccweb::stream", "Request aborted");
        self.sink.emit(abort_message(now_ms()));
        self.sink.close_assistant_message();
        self.state = StreamState::Aborted;
    }
}

/// Forwards callbacks and notes whether the processor asked for an abort.
struct AbortWatch<'a, O: SessionObserver> {
    inner: &'a mut O,
    abort_requested: bool,
}

impl<'a, O: SessionObserver> AbortWatch<'a, O> {
    fn new(inner: &'a mut O) -> Self {
        Self {
            inner,
            abort_requested: false,
        }
    }
}

impl<O: SessionObserver> SessionObserver for AbortWatch<'_, O> {
    fn on_session_id(&mut self, session_id: &str) {
        self.inner.on_session_id(session_id);
    }

    fn should_show_init_message(&self) -> bool {
        self.inner.should_show_init_message()
    }

    fn on_init_message_shown(&mut self) {
        self.inner.on_init_message_shown();
    }

    fn on_permission_error(&mut self, denial: &PermissionDenial) {
        self.inner.on_permission_error(denial);
    }

    fn on_abort_request(&mut self) {
        self.abort_requested = true;
        self.inner.on_abort_request();
    }
}
