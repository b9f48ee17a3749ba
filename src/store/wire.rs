//! Decoding of store payloads into typed events.
//!
//! `GET /events` has been seen returning both a JSON array and a JSON string
//! holding a serialized array. That difference is settled here, once, so
//! callers only ever see `Vec<Event>` or `StoreError::Decoding`.

use crate::error::{StoreError, StoreResult};
use crate::model::Event;
use serde::Deserialize;
use serde_json::Value;

pub fn decode_event_list(body: &[u8]) -> StoreResult<Vec<Event>> {
    let value: Value = serde_json::from_slice(body)?;
    let list = match value {
        Value::String(text) => serde_json::from_str::<Value>(&text)?,
        Value::Null => return Ok(Vec::new()),
        other => other,
    };
    if !list.is_array() {
        return Err(StoreError::decoding(format!(
            "expected an array of events, got {}",
            json_kind(&list)
        )));
    }
    Ok(Vec::<Event>::deserialize(list)?)
}

pub fn decode_event(body: &[u8]) -> StoreResult<Event> {
    Ok(serde_json::from_slice(body)?)
}

/// Pulls a human-readable message out of an error body, if there is one.
///
/// Accepts `{"detail": ...}` (FastAPI), `{"error": ...}` and `{"message": ...}`.
pub fn backend_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["detail", "error", "message"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
