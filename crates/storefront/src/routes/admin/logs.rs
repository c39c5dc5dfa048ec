//! Log viewer.
//!
//! The backend filters by limit, event, actor, target, and extras. Level and
//! free-text search narrow the fetched page locally. Auto-refresh is a
//! `Refresh` header, so the page reloads itself with the same query.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use deadforest_core::LogLevel;
use deadforest_core::logs::{AutoRefresh, LevelFilter, LogFilter, LogQuery, LogSummary, download_filename};
use deadforest_core::models::LogEntry;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminNav, AdminSection, load_layout};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdmin, set_flash};
use crate::models::Flash;
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Viewer query parameters. Everything is optional text so blank inputs
/// from the filter form are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsParams {
    pub limit: Option<String>,
    pub event: Option<String>,
    pub actor_id: Option<String>,
    pub target: Option<String>,
    pub extras: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
    pub refresh: Option<String>,
}

impl LogsParams {
    /// The part of the query the backend applies.
    #[must_use]
    pub fn server_query(&self) -> LogQuery {
        let query = LogQuery::new(
            None,
            self.event.as_deref(),
            parse_number(self.actor_id.as_deref()),
            self.target.as_deref(),
            self.extras.as_deref(),
        );
        match parse_number::<i64>(self.limit.as_deref()) {
            Some(limit) => query.with_limit(limit),
            None => query,
        }
    }

    /// The part applied to the fetched entries.
    #[must_use]
    pub fn local_filter(&self) -> LogFilter {
        LogFilter {
            level: LevelFilter::parse(self.level.as_deref()),
            search: self.search.clone().unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn auto_refresh(&self) -> AutoRefresh {
        AutoRefresh::parse(self.refresh.as_deref())
    }

    /// Non-blank parameters re-encoded, for the download link.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in [
            ("limit", &self.limit),
            ("event", &self.event),
            ("actor_id", &self.actor_id),
            ("target", &self.target),
            ("extras", &self.extras),
            ("level", &self.level),
            ("search", &self.search),
        ] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

fn parse_number<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Log row display data.
#[derive(Debug, Clone)]
pub struct LogRow {
    pub timestamp: String,
    pub level: String,
    pub level_class: &'static str,
    pub logger: String,
    pub request_id: String,
    pub message: String,
    pub event: Option<String>,
    pub actor_id: Option<i64>,
    pub target: Option<String>,
    pub extras: String,
    /// Whole record as pretty JSON for the expanded view.
    pub detail: String,
}

impl From<&LogEntry> for LogRow {
    fn from(entry: &LogEntry) -> Self {
        Self {
            timestamp: entry.timestamp.clone(),
            level: entry.level.to_string(),
            level_class: entry.level.color_class(),
            logger: entry.logger.clone(),
            request_id: entry.request_id.clone().unwrap_or_default(),
            message: entry.message.clone(),
            event: entry.event.clone(),
            actor_id: entry.actor_id,
            target: entry.target.clone(),
            extras: entry.extras_display(),
            detail: entry.pretty(),
        }
    }
}

/// Count badge above the table.
#[derive(Debug, Clone)]
pub struct LevelCount {
    pub level: String,
    pub class: &'static str,
    pub count: usize,
}

/// A `<select>` option.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

/// Log viewer template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/logs.html")]
pub struct LogsTemplate {
    pub layout: Layout,
    pub nav: AdminNav,
    pub params: LogsParams,
    pub limit: u32,
    pub levels: Vec<SelectOption>,
    pub refresh_options: Vec<SelectOption>,
    pub entries: Vec<LogRow>,
    pub fetched: usize,
    pub summary: LogSummary,
    pub level_counts: Vec<LevelCount>,
    pub download_href: String,
    pub error: Option<String>,
}

/// Badges for every standard level, then any custom level that was seen.
fn level_counts(summary: &LogSummary) -> Vec<LevelCount> {
    let custom = summary
        .by_level
        .iter()
        .filter(|(level, _)| matches!(level, LogLevel::Other(_)))
        .map(|(level, _)| level.clone());
    LogLevel::ALL
        .into_iter()
        .chain(custom)
        .map(|level| LevelCount {
            count: summary.count(&level),
            class: level.color_class(),
            level: level.to_string(),
        })
        .collect()
}

/// Display the log viewer.
#[instrument(skip(state, session, admin, params))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Query(params): Query<LogsParams>,
) -> Response {
    let query = params.server_query();
    let filter = params.local_filter();
    let refresh = params.auto_refresh();

    let (layout, entries) = tokio::join!(
        load_layout(&state, &session, &admin),
        state.api().admin(&admin.token).logs(&query)
    );

    let (entries, error) = match entries {
        Ok(entries) => (entries, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load logs");
            (Vec::new(), Some(e.user_message()))
        }
    };

    let visible = filter.apply(&entries);
    let summary = LogSummary::from_entries(visible.iter().copied());

    let template = LogsTemplate {
        layout,
        nav: AdminNav::new(AdminSection::Logs),
        limit: query.limit(),
        levels: LevelFilter::OPTIONS
            .iter()
            .map(|option| SelectOption {
                value: option.as_str().to_owned(),
                selected: *option == filter.level,
            })
            .collect(),
        refresh_options: AutoRefresh::ALL
            .iter()
            .map(|option| SelectOption {
                value: option.as_str().to_owned(),
                selected: *option == refresh,
            })
            .collect(),
        entries: visible.iter().map(|entry| LogRow::from(*entry)).collect(),
        fetched: entries.len(),
        level_counts: level_counts(&summary),
        summary,
        download_href: format!("/admin/logs/download?{}", params.to_query_string()),
        params,
        error,
    };

    match refresh.seconds() {
        Some(seconds) => (
            [(header::REFRESH, HeaderValue::from(seconds))],
            template,
        )
            .into_response(),
        None => template.into_response(),
    }
}

/// Download the filtered entries as a JSON attachment.
#[instrument(skip(state, admin, params))]
pub async fn download(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(params): Query<LogsParams>,
) -> Result<Response> {
    let entries = state
        .api()
        .admin(&admin.token)
        .logs(&params.server_query())
        .await?;
    let filter = params.local_filter();
    let visible: Vec<&LogEntry> = filter.apply(&entries);

    let disposition = format!("attachment; filename=\"{}\"", download_filename(Utc::now()));
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;

    tracing::info!(count = visible.len(), "Logs downloaded");
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(visible)).into_response())
}

/// Clear the backend log buffer.
#[instrument(skip(state, session, admin))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
) -> Redirect {
    match state.api().admin(&admin.token).clear_logs().await {
        Ok(response) => {
            tracing::info!(admin_id = %admin.user.id, removed = response.removed, "Logs cleared");
            set_flash(
                &session,
                Flash::success(format!("Cleared {} log entries", response.removed)),
            )
            .await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to clear logs");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/admin/logs")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params(pairs: &str) -> LogsParams {
        serde_json::from_str(pairs).unwrap()
    }

    #[test]
    fn test_blank_params_are_ignored() {
        let params = params(r#"{"limit": "", "actor_id": " ", "event": "", "level": "ALL"}"#);
        let query = params.server_query();
        assert_eq!(query.limit(), deadforest_core::logs::DEFAULT_LIMIT);
        assert_eq!(query.actor_id, None);
        assert_eq!(query.event, None);
        assert_eq!(params.local_filter().level, LevelFilter::All);
        assert_eq!(params.to_query_string(), "level=ALL");
    }

    #[test]
    fn test_params_build_server_query() {
        let params = params(
            r#"{"limit": "50", "actor_id": "7", "event": "login", "level": "ERROR", "refresh": "5s"}"#,
        );
        let query = params.server_query();
        assert_eq!(query.limit(), 50);
        assert_eq!(query.actor_id, Some(7));
        assert_eq!(query.event.as_deref(), Some("login"));
        assert_eq!(
            params.local_filter().level,
            LevelFilter::Only(LogLevel::Error)
        );
        assert_eq!(params.auto_refresh().seconds(), Some(5));
    }

    #[test]
    fn test_out_of_range_limits_are_clamped() {
        assert_eq!(params(r#"{"limit": "-5"}"#).server_query().limit(), 1);
        assert_eq!(
            params(r#"{"limit": "99999999999"}"#).server_query().limit(),
            deadforest_core::logs::MAX_LIMIT
        );
        assert_eq!(
            params(r#"{"limit": "many"}"#).server_query().limit(),
            deadforest_core::logs::DEFAULT_LIMIT
        );
    }

    #[test]
    fn test_query_string_encodes_values() {
        let params = params(r#"{"search": "a b&c"}"#);
        assert_eq!(params.to_query_string(), "search=a+b%26c");
    }
}
