//! Normalization of server error bodies.
//!
//! The backend reports failures as a bare JSON string, an object with
//! `message`, an object with `error`, or arbitrary text. All of them reduce to
//! a single human-readable string.

use serde_json::Value;

/// Shown when no readable message can be extracted.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Extract a user-facing message from an error response body.
///
/// Looks for, in order: a JSON string, a string `message` field, a string
/// `error` field. Anything else, including non-string values in those fields
/// and unparsable bodies, yields [`GENERIC_ERROR_MESSAGE`].
///
/// # Invariants
///
/// The result is never empty and never a rendering of a non-string JSON value.
pub fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return GENERIC_ERROR_MESSAGE.to_owned();
    };

    let found = match &value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => ["message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())),
        _ => None,
    };

    match found {
        Some(s) if !s.trim().is_empty() => s.to_owned(),
        _ => GENERIC_ERROR_MESSAGE.to_owned(),
    }
}
