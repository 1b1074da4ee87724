pub mod post;
pub mod user;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifier of a record.
///
/// Persisted records carry a UUID string; records synthesized in store-skip
/// mode carry a plain integer, or echo whatever id the client asked for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Seq(u64),
    Key(String),
}

impl RecordId {
    pub fn new_key() -> Self {
        RecordId::Key(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Seq(n) => write!(f, "{}", n),
            RecordId::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for RecordId {
    fn from(raw: &str) -> Self {
        RecordId::Key(raw.to_string())
    }
}

/// A single violated field constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Pushes a violation when `value` is outside `min..=max` characters.
pub(crate) fn check_length(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: &str,
    min: usize,
    max: Option<usize>,
) {
    let len = char_len(value);
    if len < min {
        violations.push(FieldViolation::new(
            field,
            format!("{} must be at least {} characters", field, min),
        ));
    }
    if let Some(max) = max {
        if len > max {
            violations.push(FieldViolation::new(
                field,
                format!("{} must be at most {} characters", field, max),
            ));
        }
    }
}

/// Pushes a "required" violation for a missing or blank value and returns the
/// value when present.
pub(crate) fn require<'a>(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            violations.push(FieldViolation::new(field, format!("{} is required", field)));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn record_id_serializes_untagged() {
        assert_eq!(serde_json::to_value(RecordId::Seq(7)).unwrap(), serde_json::json!(7));
        assert_eq!(
            serde_json::to_value(RecordId::from("abc")).unwrap(),
            serde_json::json!("abc")
        );
    }

    #[test]
    fn timestamps_are_human_readable() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(format_timestamp(&at), "2024-03-09 14:05:00");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut violations = Vec::new();
        check_length(&mut violations, "title", "가나다", 3, Some(3));
        assert!(violations.is_empty());
    }
}
