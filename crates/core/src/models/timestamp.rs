//! Lenient timestamp parsing.
//!
//! The backend emits `isoformat()` strings which may or may not carry an
//! offset (`2025-01-02T03:04:05.123456` vs `...+00:00`). Naive values are UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Parse a backend timestamp. Returns `None` for anything unrecognized.
#[must_use]
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
///
/// # Errors
///
/// Only fails when the value is neither null nor a string.
pub fn lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse))
}

/// Human-readable rendering used in tables, `—` when absent.
#[must_use]
pub fn display(value: Option<&DateTime<Utc>>) -> String {
    value.map_or_else(
        || "—".to_owned(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse("2025-03-04T05:06:07+02:00").unwrap();
        assert_eq!(dt.hour(), 3);
    }

    #[test]
    fn test_parse_naive_with_micros() {
        let dt = parse("2025-03-04T05:06:07.123456").unwrap();
        assert_eq!(dt.day(), 4);
        assert_eq!(dt.hour(), 5);
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse("2025-03-04").unwrap();
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse("yesterday").is_none());
    }

    #[test]
    fn test_display() {
        let dt = parse("2025-03-04T05:06:07Z").unwrap();
        assert_eq!(display(Some(&dt)), "2025-03-04 05:06");
        assert_eq!(display(None), "—");
    }
}
