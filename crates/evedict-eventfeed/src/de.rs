//! Lenient deserializers for upstream fields whose JSON type drifts between
//! strings, numbers and arrays.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a string or a number and yields its string form. `null` becomes
/// an empty string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Accepts a number or a numeric string. `null` and blank strings become `0.0`.
pub(crate) fn f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!(
            "expected number, got {other}"
        ))),
    }
}

/// Keeps a JSON-encoded array as its string encoding. Gamma normally sends
/// `"[\"Yes\",\"No\"]"`; a literal array is re-encoded to the same form.
pub(crate) fn json_array_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok("[]".to_string()),
        array @ Value::Array(_) => Ok(array.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected JSON-encoded array, got {other}"
        ))),
    }
}
