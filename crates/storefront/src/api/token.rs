//! Bearer token and the time-based refresh rule.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Minimum idle days before a token is refreshed.
pub const REFRESH_AFTER_DAYS: i64 = 1;

/// Past this many idle days the token is left alone; the backend will have
/// expired it and the next call fails with 401.
pub const REFRESH_WINDOW_DAYS: i64 = 30;

/// Backend access token.
///
/// Stored in the server-side session; `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken([REDACTED])")
    }
}

/// Whether the current request should refresh the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    Skip,
    Refresh,
}

/// Refresh when the last activity is more than a day but less than thirty
/// days old. Unknown or zero activity never refreshes.
#[must_use]
pub fn refresh_decision(last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> RefreshDecision {
    let Some(last) = last_activity.filter(|last| last.timestamp_millis() > 0) else {
        return RefreshDecision::Skip;
    };

    let idle = now - last;
    if idle > Duration::days(REFRESH_AFTER_DAYS) && idle < Duration::days(REFRESH_WINDOW_DAYS) {
        RefreshDecision::Refresh
    } else {
        RefreshDecision::Skip
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_refresh_window() {
        let now = now();
        assert_eq!(
            refresh_decision(Some(now - Duration::hours(2)), now),
            RefreshDecision::Skip
        );
        assert_eq!(
            refresh_decision(Some(now - Duration::days(2)), now),
            RefreshDecision::Refresh
        );
        assert_eq!(
            refresh_decision(Some(now - Duration::days(29)), now),
            RefreshDecision::Refresh
        );
        assert_eq!(
            refresh_decision(Some(now - Duration::days(31)), now),
            RefreshDecision::Skip
        );
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        let now = now();
        assert_eq!(
            refresh_decision(Some(now - Duration::days(REFRESH_AFTER_DAYS)), now),
            RefreshDecision::Skip
        );
        assert_eq!(
            refresh_decision(Some(now - Duration::days(REFRESH_WINDOW_DAYS)), now),
            RefreshDecision::Skip
        );
    }

    #[test]
    fn test_missing_or_zero_activity_skips() {
        assert_eq!(refresh_decision(None, now()), RefreshDecision::Skip);
        assert_eq!(
            refresh_decision(Some(DateTime::<Utc>::UNIX_EPOCH), now()),
            RefreshDecision::Skip
        );
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = ApiToken::new("eyJhbGciOi.secret");
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(token.expose(), "eyJhbGciOi.secret");
    }

    #[test]
    fn test_token_serializes_as_string() {
        let token = ApiToken::new("abc");
        assert_eq!(serde_json::to_string(&token).unwrap(), r#""abc""#);
    }
}
