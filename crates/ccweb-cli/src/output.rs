//! JSON lines written to stdout.

use ccweb_core::TranscriptChange;
use ccweb_types::DisplayMessage;
use serde_json::{Value, json};

/// One transcript change as a JSON object.
pub fn change_record(change: TranscriptChange, message: &DisplayMessage) -> Value {
    let (kind, index) = match change {
        TranscriptChange::Added(i) => ("added", i),
        TranscriptChange::Updated(i) => ("updated", i),
    };
    json!({
        "change": kind,
        "index": index,
        "message": message,
    })
}
