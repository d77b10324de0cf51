// ── Record identity ──
//
// The server sends integer ids for devices (database rows) and string ids
// for tasks. Both are opaque keys on the client side.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identifier for a device or task.
///
/// `1` and `"1"` are distinct keys: the client never normalizes what the
/// server chose to send.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_numbers_and_strings() {
        let n: RecordId = serde_json::from_str("7").unwrap();
        let s: RecordId = serde_json::from_str(r#""T-42""#).unwrap();
        assert_eq!(n, RecordId::Number(7));
        assert_eq!(s, RecordId::from("T-42"));
    }

    #[test]
    fn display_has_no_quotes() {
        assert_eq!(RecordId::from(7).to_string(), "7");
        assert_eq!(RecordId::from("T-42").to_string(), "T-42");
    }

    #[test]
    fn numeric_and_text_forms_are_distinct() {
        assert_ne!(RecordId::from(1), RecordId::from("1"));
    }
}
