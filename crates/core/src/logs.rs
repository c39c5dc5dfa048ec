//! Log viewer queries, filters and aggregation.
//!
//! [`LogQuery`] is sent to the backend, which filters its in-memory buffer.
//! [`LogFilter`] narrows the returned page locally. [`matches_query`]
//! reproduces the backend's filter so the CLI and tests can apply it to
//! records they already hold.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::LogEntry;
use crate::models::log::value_text;
use crate::types::LogLevel;

/// Default number of records requested.
pub const DEFAULT_LIMIT: u32 = 200;
/// Largest page the backend will return.
pub const MAX_LIMIT: u32 = 1000;

/// Server-side log query for `GET /admin/logs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    limit: u32,
    pub event: Option<String>,
    pub actor_id: Option<i64>,
    pub target: Option<String>,
    pub extras: Option<String>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            event: None,
            actor_id: None,
            target: None,
            extras: None,
        }
    }
}

impl LogQuery {
    /// Build a query from raw form input. Blank strings are dropped and the
    /// limit is clamped to `1..=1000`.
    #[must_use]
    pub fn new(
        limit: Option<u32>,
        event: Option<&str>,
        actor_id: Option<i64>,
        target: Option<&str>,
        extras: Option<&str>,
    ) -> Self {
        Self {
            limit: clamp_limit(limit.unwrap_or(DEFAULT_LIMIT)),
            event: non_blank(event),
            actor_id,
            target: non_blank(target),
            extras: non_blank(extras),
        }
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Replace the limit with raw signed input, clamped to `1..=1000` the
    /// way the backend clamps it.
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = u32::try_from(limit.clamp(1, i64::from(MAX_LIMIT))).unwrap_or(MAX_LIMIT);
        self
    }

    /// Query pairs for the backend request.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if let Some(event) = &self.event {
            pairs.push(("event", event.clone()));
        }
        if let Some(actor_id) = self.actor_id {
            pairs.push(("actor_id", actor_id.to_string()));
        }
        if let Some(target) = &self.target {
            pairs.push(("target", target.clone()));
        }
        if let Some(extras) = &self.extras {
            pairs.push(("extras", extras.clone()));
        }
        pairs
    }
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Whether `entry` passes the backend's log filter for `query`.
#[must_use]
pub fn matches_query(entry: &LogEntry, query: &LogQuery) -> bool {
    let message = entry.message.to_lowercase();

    if let Some(event) = &query.event {
        let ok = entry.event.as_ref().map_or_else(
            || message.contains(&event.to_lowercase()),
            |structured| structured == event,
        );
        if !ok {
            return false;
        }
    }

    if let Some(actor_id) = query.actor_id {
        let ok = entry.actor_id.map_or_else(
            || entry.message.contains(&format!("actor_id={actor_id}")),
            |structured| structured == actor_id,
        );
        if !ok {
            return false;
        }
    }

    if let Some(target) = &query.target {
        let needle = target.to_lowercase();
        let in_target = entry
            .target
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&needle));
        if !in_target && !message.contains(&needle) {
            return false;
        }
    }

    query
        .extras
        .as_deref()
        .is_none_or(|extras| extras_match(entry, extras, &message))
}

fn extras_match(entry: &LogEntry, query: &str, message: &str) -> bool {
    let needle = query.to_lowercase();
    let empty = serde_json::Map::new();
    let extras = entry.extras.as_ref().unwrap_or(&empty);

    let serialized = serde_json::to_string(extras)
        .unwrap_or_default()
        .to_lowercase();
    if serialized.contains(&needle) || message.contains(&needle) {
        return true;
    }

    query.split_whitespace().all(|part| {
        if let Some((key, value)) = part.split_once('=') {
            extras.get(key).is_some_and(|v| {
                value_text(v)
                    .to_lowercase()
                    .contains(&value.to_lowercase())
            })
        } else {
            let part = part.to_lowercase();
            extras
                .values()
                .any(|v| value_text(v).to_lowercase().contains(&part))
        }
    })
}

/// Level selector in the log viewer. Only the levels the viewer offers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Only(LogLevel),
}

impl LevelFilter {
    /// Options shown in the selector.
    pub const OPTIONS: [Self; 4] = [
        Self::All,
        Self::Only(LogLevel::Info),
        Self::Only(LogLevel::Warning),
        Self::Only(LogLevel::Error),
    ];

    /// Parse the selector value. Unknown values mean `ALL`.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).map_or(Self::All, Self::Only)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "ALL",
            Self::Only(level) => level.as_str(),
        }
    }
}

/// Local narrowing of a fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub level: LevelFilter,
    /// Case-insensitive substring over the whole record as JSON.
    pub search: String,
}

impl LogFilter {
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if matches!(&self.level, LevelFilter::Only(level) if entry.level != *level) {
            return false;
        }
        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        serde_json::to_string(entry)
            .map(|json| json.to_lowercase().contains(&term))
            .unwrap_or(false)
    }

    /// Entries passing the filter, newest first as received.
    #[must_use]
    pub fn apply<'a>(&self, entries: &'a [LogEntry]) -> Vec<&'a LogEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Counts shown above the log table and printed by `df-cli logs summary`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSummary {
    pub total: usize,
    pub by_level: Vec<(LogLevel, usize)>,
    /// Most frequent structured events, most frequent first.
    pub top_events: Vec<(String, usize)>,
    pub newest: Option<String>,
    pub oldest: Option<String>,
}

impl LogSummary {
    pub const TOP_EVENTS: usize = 5;

    /// Summarize entries as returned by the backend (newest first).
    #[must_use]
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        let mut total = 0;
        let mut levels: HashMap<LogLevel, usize> = HashMap::new();
        let mut events: HashMap<&str, usize> = HashMap::new();
        let mut newest = None;
        let mut oldest = None;

        for entry in entries {
            total += 1;
            *levels.entry(entry.level.clone()).or_default() += 1;
            if let Some(event) = entry.event.as_deref() {
                *events.entry(event).or_default() += 1;
            }
            if newest.is_none() {
                newest = Some(entry.timestamp.clone());
            }
            oldest = Some(entry.timestamp.clone());
        }

        let mut by_level: Vec<(LogLevel, usize)> = LogLevel::ALL
            .into_iter()
            .filter_map(|level| levels.remove(&level).map(|count| (level, count)))
            .collect();
        let mut custom: Vec<(LogLevel, usize)> = levels.into_iter().collect();
        custom.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        by_level.extend(custom);

        let mut top_events: Vec<(String, usize)> = events
            .into_iter()
            .map(|(event, count)| (event.to_owned(), count))
            .collect();
        top_events.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_events.truncate(Self::TOP_EVENTS);

        Self {
            total,
            by_level,
            top_events,
            newest,
            oldest,
        }
    }

    /// Count for one level, zero when absent.
    #[must_use]
    pub fn count(&self, level: &LogLevel) -> usize {
        self.by_level
            .iter()
            .find(|(l, _)| l == level)
            .map_or(0, |(_, count)| *count)
    }
}

/// Attachment name for a log download, e.g.
/// `logs-2025-03-04T10-20-30-123Z.json`.
#[must_use]
pub fn download_filename(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("logs-{stamp}.json")
}

/// Auto-refresh interval of the log viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoRefresh {
    #[default]
    Off,
    TwoSeconds,
    FiveSeconds,
    TenSeconds,
}

impl AutoRefresh {
    pub const ALL: [Self; 4] = [
        Self::Off,
        Self::TwoSeconds,
        Self::FiveSeconds,
        Self::TenSeconds,
    ];

    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("2s") => Self::TwoSeconds,
            Some("5s") => Self::FiveSeconds,
            Some("10s") => Self::TenSeconds,
            _ => Self::Off,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::TwoSeconds => "2s",
            Self::FiveSeconds => "5s",
            Self::TenSeconds => "10s",
        }
    }

    /// Seconds between reloads, `None` when off.
    #[must_use]
    pub const fn seconds(&self) -> Option<u64> {
        match self {
            Self::Off => None,
            Self::TwoSeconds => Some(2),
            Self::FiveSeconds => Some(5),
            Self::TenSeconds => Some(10),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn audit(event: &str, actor: i64, target: Option<&str>, extras: serde_json::Value) -> LogEntry {
        LogEntry {
            timestamp: "2025-01-02T00:00:00+00:00".to_string(),
            level: LogLevel::Info,
            logger: "audit".to_string(),
            request_id: None,
            message: format!("event={event} actor_id={actor}"),
            event: Some(event.to_string()),
            actor_id: Some(actor),
            target: target.map(String::from),
            extras: extras.as_object().cloned(),
        }
    }

    fn plain(level: LogLevel, message: &str) -> LogEntry {
        LogEntry {
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            level,
            logger: "app".to_string(),
            request_id: None,
            message: message.to_string(),
            event: None,
            actor_id: None,
            target: None,
            extras: None,
        }
    }

    fn query() -> LogQuery {
        LogQuery::default()
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(LogQuery::new(Some(0), None, None, None, None).limit(), 1);
        assert_eq!(LogQuery::new(Some(5000), None, None, None, None).limit(), 1000);
        assert_eq!(LogQuery::new(None, None, None, None, None).limit(), 200);
    }

    #[test]
    fn test_blank_fields_dropped() {
        let q = LogQuery::new(None, Some("  "), Some(3), Some(""), Some(" ip "));
        assert_eq!(
            q.pairs(),
            vec![
                ("limit", "200".to_string()),
                ("actor_id", "3".to_string()),
                ("extras", "ip".to_string()),
            ]
        );
    }

    #[test]
    fn test_event_exact_on_structured() {
        let entry = audit("auth.login", 1, None, json!({}));
        let q = LogQuery {
            event: Some("auth.login".to_string()),
            ..query()
        };
        assert!(matches_query(&entry, &q));
        let q = LogQuery {
            event: Some("auth".to_string()),
            ..query()
        };
        assert!(!matches_query(&entry, &q));
    }

    #[test]
    fn test_event_substring_on_plain() {
        let entry = plain(LogLevel::Info, "User LOGIN succeeded");
        let q = LogQuery {
            event: Some("login".to_string()),
            ..query()
        };
        assert!(matches_query(&entry, &q));
    }

    #[test]
    fn test_actor_id_fallback_to_message() {
        let entry = plain(LogLevel::Info, "event=x actor_id=42 ok");
        let q = LogQuery {
            actor_id: Some(42),
            ..query()
        };
        assert!(matches_query(&entry, &q));
        let q = LogQuery {
            actor_id: Some(4),
            ..query()
        };
        assert!(matches_query(&entry, &q), "substring match like the backend");
        let q = LogQuery {
            actor_id: Some(7),
            ..query()
        };
        assert!(!matches_query(&entry, &q));
        let structured = audit("x", 9, None, json!({}));
        assert!(!matches_query(&structured, &q));
    }

    #[test]
    fn test_target_in_target_or_message() {
        let entry = audit("product.update", 1, Some("product:12"), json!({}));
        let q = LogQuery {
            target: Some("PRODUCT:1".to_string()),
            ..query()
        };
        assert!(matches_query(&entry, &q));
        let q = LogQuery {
            target: Some("actor_id".to_string()),
            ..query()
        };
        assert!(matches_query(&entry, &q));
        let q = LogQuery {
            target: Some("user:".to_string()),
            ..query()
        };
        assert!(!matches_query(&entry, &q));
    }

    #[test]
    fn test_extras_substring_and_pairs() {
        let entry = audit(
            "auth.login",
            1,
            None,
            json!({"ip": "10.0.0.1", "agent": "Firefox", "attempts": 3}),
        );
        let with = |extras: &str| LogQuery {
            extras: Some(extras.to_string()),
            ..query()
        };
        assert!(matches_query(&entry, &with("10.0.0")));
        assert!(matches_query(&entry, &with("ip=10.0 agent=fire")));
        assert!(matches_query(&entry, &with("attempts=3 firefox")));
        assert!(!matches_query(&entry, &with("ip=192 agent=fire")));
        assert!(!matches_query(&entry, &with("missing=1")));
        assert!(!matches_query(&entry, &with("chrome")));
    }

    #[test]
    fn test_extras_matches_message() {
        let entry = plain(LogLevel::Warning, "slow_sql duration_ms=900");
        let q = LogQuery {
            extras: Some("duration_ms=900".to_string()),
            ..query()
        };
        assert!(matches_query(&entry, &q));
    }

    #[test]
    fn test_with_limit_clamps_signed_input() {
        assert_eq!(query().with_limit(-5).limit(), 1);
        assert_eq!(query().with_limit(0).limit(), 1);
        assert_eq!(query().with_limit(250).limit(), 250);
        assert_eq!(query().with_limit(99_999_999_999).limit(), MAX_LIMIT);
    }

    #[test]
    fn test_local_filter() {
        let entries = vec![
            plain(LogLevel::Info, "started"),
            plain(LogLevel::Error, "boom"),
            plain(LogLevel::Warning, "slow"),
        ];
        let filter = LogFilter {
            level: LevelFilter::parse(Some("ERROR")),
            search: String::new(),
        };
        assert_eq!(filter.apply(&entries).len(), 1);

        let filter = LogFilter {
            level: LevelFilter::All,
            search: "SLOW".to_string(),
        };
        assert_eq!(filter.apply(&entries)[0].message, "slow");

        let filter = LogFilter {
            level: LevelFilter::All,
            search: "app".to_string(),
        };
        assert_eq!(filter.apply(&entries).len(), 3, "search covers every field");
    }

    #[test]
    fn test_level_filter_parse() {
        assert_eq!(LevelFilter::parse(Some("ALL")), LevelFilter::All);
        assert_eq!(LevelFilter::parse(None), LevelFilter::All);
        assert_eq!(
            LevelFilter::parse(Some("warning")),
            LevelFilter::Only(LogLevel::Warning)
        );
    }

    #[test]
    fn test_summary() {
        let mut newest = audit("auth.login", 1, None, json!({}));
        newest.timestamp = "2025-01-03T00:00:00+00:00".to_string();
        let entries = vec![
            newest,
            audit("auth.login", 2, None, json!({})),
            audit("cart.add", 2, None, json!({})),
            plain(LogLevel::Error, "boom"),
        ];
        let summary = LogSummary::from_entries(&entries);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.count(&LogLevel::Info), 3);
        assert_eq!(summary.count(&LogLevel::Error), 1);
        assert_eq!(summary.count(&LogLevel::Critical), 0);
        assert_eq!(summary.top_events[0], ("auth.login".to_string(), 2));
        assert_eq!(summary.newest.as_deref(), Some("2025-01-03T00:00:00+00:00"));
        assert_eq!(summary.oldest.as_deref(), Some("2025-01-01T00:00:00+00:00"));
    }

    #[test]
    fn test_summary_counts_custom_levels_last() {
        let entries = vec![
            plain(LogLevel::Other("Level 25".to_string()), "custom"),
            plain(LogLevel::Warning, "slow"),
        ];
        let summary = LogSummary::from_entries(&entries);
        assert_eq!(
            summary.by_level,
            vec![
                (LogLevel::Warning, 1),
                (LogLevel::Other("Level 25".to_string()), 1),
            ]
        );
        assert_eq!(summary.count(&LogLevel::Other("Level 25".to_string())), 1);
    }

    #[test]
    fn test_summary_empty() {
        let summary = LogSummary::from_entries(&Vec::<LogEntry>::new());
        assert_eq!(summary, LogSummary::default());
    }

    #[test]
    fn test_download_filename() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 10, 20, 30).unwrap();
        assert_eq!(download_filename(now), "logs-2025-03-04T10-20-30-000Z.json");
    }

    #[test]
    fn test_auto_refresh() {
        assert_eq!(AutoRefresh::parse(Some("5s")).seconds(), Some(5));
        assert_eq!(AutoRefresh::parse(Some("bogus")), AutoRefresh::Off);
        assert_eq!(AutoRefresh::Off.seconds(), None);
    }
}
