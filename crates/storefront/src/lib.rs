//! DeadForest storefront library.
//!
//! Server-rendered pages for the DeadForest shop and its admin panel. All
//! data comes from the DeadForest backend API; this crate holds no database.
//! The router is exposed here so it can be driven in tests without binding a
//! socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use std::path::Path;

use axum::{Router, body::Body, http::Request, middleware as axum_middleware};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ConfigError;
use crate::state::AppState;

/// Directory holding CSS and images, relative to this crate.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the full application router.
///
/// Layers, outermost first: Sentry, request span, request ID, security
/// headers, session, token refresh.
///
/// # Errors
///
/// Returns an error if the session signing key cannot be derived from the
/// configured secret.
pub fn app(state: AppState) -> Result<Router, ConfigError> {
    let session_layer = middleware::create_session_layer(state.config())?;

    Ok(Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(Path::new(STATIC_DIR)))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::token_refresh_middleware,
        ))
        .layer(session_layer)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header};
    use secrecy::SecretString;
    use tower::ServiceExt;
    use url::Url;

    use super::*;
    use crate::config::StorefrontConfig;

    const TEST_SECRET: &str =
        "k3Jx9QvT2mPzL7wRbN4cYhF8sDgA1eUoZ6tKiV5nMqWjXrC0lBpEy2HfGdSaO9uT";

    fn test_app() -> Router {
        // Nothing listens here; these routes must not reach the backend.
        let config = StorefrontConfig::for_api(
            Url::parse("http://127.0.0.1:9").unwrap(),
            SecretString::from(TEST_SECRET),
        );
        app(AppState::new(config).unwrap()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_security_headers_applied() {
        let response = test_app().oneshot(get("/health")).await.unwrap();
        let headers = response.headers();

        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert!(
            headers
                .get(header::CONTENT_SECURITY_POLICY)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("http://127.0.0.1:9")
        );
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_profile_requires_login() {
        let response = test_app().oneshot(get("/profile")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_admin_requires_login() {
        let response = test_app().oneshot(get("/admin")).await.unwrap();
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_login_page_renders_for_anonymous() {
        let response = test_app().oneshot(get("/login")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("action=\"/login\""));
        assert!(html.contains("Sign up"));
    }

    #[tokio::test]
    async fn test_static_css_served() {
        let response = test_app().oneshot(get("/static/css/main.css")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
