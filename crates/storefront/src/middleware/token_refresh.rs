//! Best-effort token refresh.
//!
//! Runs once per request for signed-in sessions. A token idle for more than
//! a day (but less than thirty) is swapped for a fresh one; a token the
//! backend rejects is dropped. Any other failure leaves the session as it is.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tower_sessions::Session;

use crate::api::{ApiToken, RefreshDecision, refresh_decision};
use crate::middleware::auth::{api_token, clear_api_token, last_activity, replace_api_token, touch_activity};
use crate::state::AppState;

pub async fn token_refresh_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if let Some(token) = api_token(&session).await {
        refresh_if_due(&state, &session, token).await;
    }
    next.run(request).await
}

async fn refresh_if_due(state: &AppState, session: &Session, token: ApiToken) {
    let decision = refresh_decision(last_activity(session).await, Utc::now());

    if decision == RefreshDecision::Refresh {
        match state.api().auth().refresh(&token).await {
            Ok(refreshed) if !refreshed.access_token.is_empty() => {
                if let Err(e) = replace_api_token(session, &ApiToken::new(refreshed.access_token)).await {
                    tracing::warn!(error = %e, "Failed to store refreshed token");
                }
                tracing::debug!("Refreshed API token");
            }
            Ok(_) => {}
            Err(err) if err.is_unauthorized() => {
                tracing::info!("Stored token rejected on refresh, signing out");
                if let Err(e) = clear_api_token(session).await {
                    tracing::warn!(error = %e, "Failed to clear rejected token");
                }
                return;
            }
            Err(err) => {
                tracing::debug!(error = %err, "Token refresh failed, keeping current token");
            }
        }
    }

    if let Err(e) = touch_activity(session).await {
        tracing::warn!(error = %e, "Failed to record session activity");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Json, Router,
        body::Body,
        http::StatusCode,
        middleware,
        routing::{get, post},
    };
    use chrono::{DateTime, Duration};
    use secrecy::SecretString;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;
    use url::Url;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::models::session_keys;

    const TEST_SECRET: &str = "Zp4kQ8wN2xR6tV0bM3jH7cL1sF5gD9eY2uA6iO0nT4yK8rW1vB5mX3zC7hJ9qP2e";

    /// A backend whose `/auth/refresh` always answers with `status`.
    async fn refresh_backend(status: StatusCode) -> Url {
        let app = Router::new().route(
            "/auth/refresh",
            post(move || async move {
                if status.is_success() {
                    (status, Json(json!({ "access_token": "fresh-token", "token_type": "bearer" })))
                } else {
                    (status, Json(json!({ "detail": "Could not validate credentials" })))
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    async fn idle_session(idle: Duration) -> Session {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session
            .insert(session_keys::API_TOKEN, ApiToken::new("stale-token"))
            .await
            .unwrap();
        session
            .insert(session_keys::LAST_ACTIVITY, Utc::now() - idle)
            .await
            .unwrap();
        session
    }

    /// Send one request through the middleware with `session` attached.
    async fn run(status: StatusCode, session: &Session) {
        let config =
            StorefrontConfig::for_api(refresh_backend(status).await, SecretString::from(TEST_SECRET));
        let state = AppState::new(config).unwrap();
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                token_refresh_middleware,
            ))
            .with_state(state);

        let mut request = axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(session.clone());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    fn is_recent(at: Option<DateTime<Utc>>) -> bool {
        at.is_some_and(|at| Utc::now() - at < Duration::minutes(1))
    }

    #[tokio::test]
    async fn test_idle_token_is_replaced() {
        let session = idle_session(Duration::days(2)).await;
        run(StatusCode::OK, &session).await;

        assert_eq!(api_token(&session).await, Some(ApiToken::new("fresh-token")));
        assert!(is_recent(last_activity(&session).await));
    }

    #[tokio::test]
    async fn test_recent_token_is_kept() {
        let session = idle_session(Duration::hours(3)).await;
        run(StatusCode::OK, &session).await;

        assert_eq!(api_token(&session).await, Some(ApiToken::new("stale-token")));
        assert!(is_recent(last_activity(&session).await));
    }

    #[tokio::test]
    async fn test_rejected_token_is_cleared() {
        let session = idle_session(Duration::days(2)).await;
        run(StatusCode::UNAUTHORIZED, &session).await;

        assert!(api_token(&session).await.is_none());
        assert!(last_activity(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_token() {
        let session = idle_session(Duration::days(2)).await;
        run(StatusCode::INTERNAL_SERVER_ERROR, &session).await;

        assert_eq!(api_token(&session).await, Some(ApiToken::new("stale-token")));
        assert!(is_recent(last_activity(&session).await));
    }
}
