//! Backend log records exposed through `/admin/logs`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::LogLevel;

/// One buffered log record.
///
/// Audit records carry the structured `event`, `actor_id`, `target` and
/// `extras` fields; plain records only have the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601 timestamp, kept verbatim so downloads match the backend.
    pub timestamp: String,
    pub level: LogLevel,
    pub logger: String,
    #[serde(default)]
    pub request_id: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_actor_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub actor_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Map<String, Value>>,
}

impl LogEntry {
    /// Extras rendered as `key=value` pairs in key order.
    #[must_use]
    pub fn extras_display(&self) -> String {
        self.extras
            .as_ref()
            .map(|extras| {
                extras
                    .iter()
                    .map(|(k, v)| format!("{k}={}", value_text(v)))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    /// Pretty JSON for the detail view.
    #[must_use]
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.message.clone())
    }

    /// Whether the record carries structured audit fields.
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        self.event.is_some()
    }
}

/// Text of a JSON value without the quotes strings get from `to_string`.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `actor_id` is an integer when it parsed cleanly and a raw string when it
/// did not; anything non-numeric is dropped.
fn lenient_actor_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// `DELETE /admin/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearLogsResponse {
    pub status: String,
    pub removed: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_entry() {
        let entry: LogEntry = serde_json::from_str(
            r#"{"timestamp": "2025-01-01T00:00:00+00:00", "level": "INFO", "logger": "audit",
                "request_id": "-", "message": "event=auth.login actor_id=7 ip=1.2.3.4",
                "event": "auth.login", "actor_id": "7", "extras": {"ip": "1.2.3.4"}}"#,
        )
        .unwrap();
        assert_eq!(entry.actor_id, Some(7));
        assert!(entry.is_structured());
        assert_eq!(entry.extras_display(), "ip=1.2.3.4");
    }

    #[test]
    fn test_plain_entry() {
        let entry: LogEntry = serde_json::from_str(
            r#"{"timestamp": "2025-01-01T00:00:00+00:00", "level": "WARNING", "logger": "sql.slow",
                "request_id": null, "message": "slow_sql duration_ms=900"}"#,
        )
        .unwrap();
        assert!(!entry.is_structured());
        assert_eq!(entry.extras_display(), "");
        assert!(!entry.pretty().contains("extras"));
    }

    #[test]
    fn test_non_numeric_actor_is_dropped() {
        let entry: LogEntry = serde_json::from_str(
            r#"{"timestamp": "t", "level": "INFO", "logger": "audit", "message": "m", "actor_id": "system"}"#,
        )
        .unwrap();
        assert_eq!(entry.actor_id, None);
    }
}
