// ── Lenient field decoding ──
//
// The server fills payloads from loosely typed records: display strings can
// arrive as null or numbers, counters as numeric strings. These helpers read
// the raw JSON value and fall back to a default instead of failing the whole
// event.

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// Display string: null becomes empty, scalars are rendered as text.
pub(crate) fn string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(opt_string(de)?.unwrap_or_default())
}

/// Optional display string: null, arrays and objects become `None`.
pub(crate) fn opt_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

/// Non-negative counter: integers or numeric strings, anything else is 0.
pub(crate) fn count<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Any JSON number, kept as sent; numeric strings are accepted, anything
/// else is 0.
pub(crate) fn number<'de, D: Deserializer<'de>>(de: D) -> Result<Number, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n,
        Value::String(s) => s.trim().parse().unwrap_or_else(|_| Number::from(0_u64)),
        _ => Number::from(0_u64),
    })
}
