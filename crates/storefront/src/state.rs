//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::http::header::InvalidHeaderValue;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::middleware::security_headers::content_security_policy;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build API client: {0}")]
    Api(#[from] ApiError),
    #[error("invalid Content-Security-Policy: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. There is no database; the
/// backend client is the only shared resource.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    content_security_policy: HeaderValue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the API origin
    /// cannot be placed in a header.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let api = ApiClient::new(config.api_url.clone(), config.api_timeout)?;
        let csp = content_security_policy(&config.api_origin(), config.is_secure());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                content_security_policy: HeaderValue::from_str(&csp)?,
                config,
                api,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn content_security_policy(&self) -> &HeaderValue {
        &self.inner.content_security_policy
    }

    /// Absolute URL for an image path returned by the backend.
    #[must_use]
    pub fn image_url(&self, image: Option<&str>) -> String {
        deadforest_core::catalog::resolve_image_url(self.api().base_url(), image)
    }
}
