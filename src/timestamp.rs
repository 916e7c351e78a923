//! Timestamp field helpers.
//!
//! Loggly recognises a top-level `timestamp` field in ISO-8601 form and uses
//! it instead of the arrival time.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Field name Loggly parses as the event time.
pub const TIMESTAMP_KEY: &str = "timestamp";
/// `YYYY-MM-DDTHH:MM:SS.mmmZ`, always with three fractional digits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Return the timestamp field name and the current UTC time.
pub fn timestamp() -> (&'static str, String) {
    (TIMESTAMP_KEY, format_timestamp(Utc::now()))
}

/// Format `at` the way [`timestamp`] does.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Insert the current timestamp into a JSON object payload.
///
/// An existing `timestamp` field is left untouched, as are non-object
/// payloads.
pub fn with_timestamp(mut payload: Value) -> Value {
    if let Value::Object(fields) = &mut payload {
        let (key, value) = timestamp();
        fields.entry(key).or_insert(Value::String(value));
    }
    payload
}
