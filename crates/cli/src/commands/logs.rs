//! Log commands.
//!
//! # Usage
//!
//! ```bash
//! df-cli logs tail --limit 50 --event login --level ERROR
//! df-cli logs summary
//! df-cli logs clear
//! ```

use std::fmt::Write;

use deadforest_core::logs::{LevelFilter, LogFilter, LogQuery, LogSummary};
use deadforest_core::models::LogEntry;

use super::{CliError, Session};

/// Server-side query plus the local level filter.
#[derive(Debug, Default)]
pub struct TailOptions {
    pub limit: Option<u32>,
    pub event: Option<String>,
    pub actor_id: Option<i64>,
    pub target: Option<String>,
    pub extras: Option<String>,
    pub level: Option<String>,
}

impl TailOptions {
    fn query(&self) -> LogQuery {
        LogQuery::new(
            self.limit,
            self.event.as_deref(),
            self.actor_id,
            self.target.as_deref(),
            self.extras.as_deref(),
        )
    }

    fn filter(&self) -> LogFilter {
        LogFilter {
            level: LevelFilter::parse(self.level.as_deref()),
            search: String::new(),
        }
    }
}

/// Print matching entries, oldest last as the backend returns them.
pub async fn tail(session: &Session, options: &TailOptions) -> Result<(), CliError> {
    let entries = session.admin().logs(&options.query()).await?;
    let filter = options.filter();
    let visible = filter.apply(&entries);

    for entry in &visible {
        tracing::info!("{}", entry_line(entry));
    }
    tracing::info!("{} of {} entries", visible.len(), entries.len());
    Ok(())
}

fn entry_line(entry: &LogEntry) -> String {
    let mut line = format!(
        "{} {:<8} {} {}",
        entry.timestamp,
        entry.level.as_str(),
        entry.logger,
        entry.message
    );
    if entry.is_structured() {
        let _ = write!(line, " [{}", entry.event.as_deref().unwrap_or_default());
        if let Some(actor_id) = entry.actor_id {
            let _ = write!(line, " actor={actor_id}");
        }
        if let Some(target) = entry.target.as_deref() {
            let _ = write!(line, " target={target}");
        }
        line.push(']');
    }
    let extras = entry.extras_display();
    if !extras.is_empty() {
        line.push_str(" | ");
        line.push_str(&extras);
    }
    line
}

/// Print counts per level and the most frequent events.
pub async fn summary(session: &Session, limit: Option<u32>) -> Result<(), CliError> {
    let query = LogQuery::new(limit, None, None, None, None);
    let entries = session.admin().logs(&query).await?;
    let summary = LogSummary::from_entries(&entries);

    tracing::info!("{} entries", summary.total);
    if let (Some(oldest), Some(newest)) = (&summary.oldest, &summary.newest) {
        tracing::info!("from {oldest} to {newest}");
    }
    for (level, count) in &summary.by_level {
        tracing::info!("  {:<8} {count}", level.as_str());
    }
    if !summary.top_events.is_empty() {
        tracing::info!("top events:");
        for (event, count) in &summary.top_events {
            tracing::info!("  {event} ({count})");
        }
    }
    Ok(())
}

/// Empty the backend's log buffer.
pub async fn clear(session: &Session) -> Result<(), CliError> {
    let response = session.admin().clear_logs().await?;
    tracing::info!("Cleared {} log entries", response.removed);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use deadforest_core::LogLevel;

    use super::*;

    #[test]
    fn test_tail_options() {
        let options = TailOptions {
            limit: Some(5000),
            event: Some(" ".to_string()),
            level: Some("warning".to_string()),
            ..TailOptions::default()
        };
        let query = options.query();
        assert_eq!(query.limit(), deadforest_core::logs::MAX_LIMIT);
        assert_eq!(query.event, None);
        assert_eq!(options.filter().level, LevelFilter::Only(LogLevel::Warning));
    }

    #[test]
    fn test_entry_line() {
        let entry: LogEntry = serde_json::from_str(
            r#"{"timestamp": "2025-01-02T03:04:05Z", "level": "INFO", "logger": "app",
                "message": "login ok", "extras": {"ip": "1.2.3.4"}}"#,
        )
        .unwrap();
        let line = entry_line(&entry);
        assert!(line.starts_with("2025-01-02T03:04:05Z INFO"));
        assert!(line.contains("login ok"));
        assert!(line.contains("1.2.3.4"));
        assert!(!line.contains('['));
    }

    #[test]
    fn test_entry_line_structured() {
        let entry: LogEntry = serde_json::from_str(
            r#"{"timestamp": "2025-01-02T03:04:05Z", "level": "INFO", "logger": "audit",
                "message": "role change", "event": "user.promote", "actor_id": 1,
                "target": "bob@example.com"}"#,
        )
        .unwrap();
        let line = entry_line(&entry);
        assert!(line.contains("[user.promote actor=1 target=bob@example.com]"));
    }
}
