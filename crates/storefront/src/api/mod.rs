//! DeadForest REST API client.
//!
//! Every piece of state lives in the backend. This module wraps it in one
//! cloneable [`ApiClient`] with typed endpoint groups:
//!
//! - [`AuthApi`] - login, registration, profile, password reset
//! - [`ProductsApi`] - public catalog
//! - [`CartApi`] / [`OrdersApi`] - the signed-in user's cart and orders
//! - [`AdminApi`] - back-office endpoints (admin token required)
//! - [`UsersApi`] - user directory
//!
//! Groups that need a bearer token borrow it (`client.cart(&token)`), so an
//! authenticated call cannot be made without one.
//!
//! # Example
//!
//! ```rust,ignore
//! let client = ApiClient::new(config.api_url.clone(), config.api_timeout)?;
//! let token = ApiToken::new(client.auth().login("ada@example.com", "hunter22").await?.access_token);
//! let cart = client.cart(&token).get().await?;
//! ```
//!
//! Errors are never retried. Non-2xx responses become [`ApiError::Status`]
//! carrying the message the backend supplied.

mod admin;
mod auth;
mod cart;
mod error;
mod orders;
mod products;
mod token;
mod users;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use cart::CartApi;
pub use error::{ApiError, ErrorFallback};
pub use orders::OrdersApi;
pub use products::ProductsApi;
pub use token::{ApiToken, REFRESH_AFTER_DAYS, REFRESH_WINDOW_DAYS, RefreshDecision, refresh_decision};
pub use users::UsersApi;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::middleware::request_id::{REQUEST_ID_HEADER, current_request_id};

/// How much of an error body is written to the log.
const LOGGED_BODY_CHARS: usize = 500;

/// Client for the DeadForest backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deadforest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: with_trailing_slash(base_url),
            }),
        })
    }

    /// The backend base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Start a request. Adds `Accept`, the bearer token when given, and the
    /// current request ID so backend logs correlate with ours.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&ApiToken>,
    ) -> Result<RequestBuilder, ApiError> {
        let mut builder = self
            .inner
            .http
            .request(method, self.url(path)?)
            .header(ACCEPT, "application/json");

        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose());
        }
        if let Some(request_id) = current_request_id() {
            builder = builder.header(REQUEST_ID_HEADER, request_id);
        }

        Ok(builder)
    }

    /// Send a request and turn non-2xx responses into errors.
    async fn send(
        &self,
        builder: RequestBuilder,
        fallback: ErrorFallback,
    ) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited { retry_after });
        }

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_owned();
        let body = response.text().await.unwrap_or_default();
        let logged_body = body.chars().take(LOGGED_BODY_CHARS).collect::<String>();
        if status.is_server_error() {
            tracing::error!(status = %status, path = %url, body = %logged_body, "API returned server error");
        } else {
            tracing::debug!(status = %status, path = %url, body = %logged_body, "API rejected request");
        }

        Err(ApiError::Status {
            status,
            message: error::error_message(&body, status, fallback),
        })
    }

    /// Send and decode a JSON body.
    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: ErrorFallback,
    ) -> Result<T, ApiError> {
        let response = self.send(builder, fallback).await?;
        let text = response.text().await?;
        decode(&text)
    }

    /// Send and decode a JSON body that may be absent (`204 No Content` or
    /// an empty body).
    pub(crate) async fn optional_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: ErrorFallback,
    ) -> Result<Option<T>, ApiError> {
        let response = self.send(builder, fallback).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        decode(&text).map(Some)
    }

    /// Send and discard whatever body comes back.
    pub(crate) async fn empty(
        &self,
        builder: RequestBuilder,
        fallback: ErrorFallback,
    ) -> Result<(), ApiError> {
        self.send(builder, fallback).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
            "Failed to decode API response"
        );
        ApiError::Decode(e)
    })
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// A file received from a browser form, forwarded as multipart `file`.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    /// Empty when the browser sent more than the form's size limit.
    pub bytes: Vec<u8>,
    /// Bytes the browser sent.
    pub size: u64,
}

impl Upload {
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    fn into_form(self) -> Result<reqwest::multipart::Form, ApiError> {
        let mut part = reqwest::multipart::Part::bytes(self.bytes).file_name(self.file_name);
        if let Some(content_type) = self.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        Ok(reqwest::multipart::Form::new().part("file", part))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        let client = client("http://127.0.0.1:8000/api");
        assert_eq!(
            client.url("/products/3").unwrap().as_str(),
            "http://127.0.0.1:8000/api/products/3"
        );
    }

    #[test]
    fn test_url_join_root() {
        let client = client("http://127.0.0.1:8000");
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/");
        assert_eq!(client.url("auth/me").unwrap().as_str(), "http://127.0.0.1:8000/auth/me");
    }

    #[test]
    fn test_decode_error() {
        let result: Result<Vec<u32>, _> = decode("{not json");
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_debug_shows_base_url() {
        let debug = format!("{:?}", client("http://backend:8000"));
        assert!(debug.contains("http://backend:8000/"));
    }
}
