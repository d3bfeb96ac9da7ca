//! Event timestamp normalization.
//!
//! Persisted history stores creation times as RFC 3339 strings, while some
//! producers write epoch numbers (seconds or milliseconds). Everything is
//! normalized to epoch milliseconds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Epoch values below this are treated as seconds.
const SECONDS_CUTOFF: i64 = 1_000_000_000_000;

/// Serialize an optional millisecond timestamp as a plain number.
pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    value.serialize(serializer)
}

/// Deserialize a timestamp given as RFC 3339 text or an epoch number.
///
/// Unparseable values become `None` rather than failing the whole event.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Int(n)) => Some(normalize_epoch(n)),
        Some(Raw::Float(f)) => Some(normalize_epoch_f64(f)),
        Some(Raw::Text(s)) => parse_timestamp(&s),
    })
}

/// Parse a textual timestamp (RFC 3339 or a numeric epoch string) into epoch ms.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(normalize_epoch(n));
    }
    text.parse::<f64>().ok().map(normalize_epoch_f64)
}

fn normalize_epoch(n: i64) -> i64 {
    if n.abs() < SECONDS_CUTOFF {
        n.saturating_mul(1000)
    } else {
        n
    }
}

fn normalize_epoch_f64(f: f64) -> i64 {
    if f.abs() < SECONDS_CUTOFF as f64 {
        (f * 1000.0).round() as i64
    } else {
        f.round() as i64
    }
}
