//! Errors from the backend API and how their messages are derived.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose body did not match the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-2xx response. `message` is already user-facing.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// A path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Message safe to show in a page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            Self::RateLimited { retry_after } => {
                format!("Too many requests, try again in {retry_after} seconds")
            }
            Self::Transport(_) => "Could not reach the server".to_string(),
            Self::Decode(_) => "Unexpected response from the server".to_string(),
            Self::Url(_) => "Invalid request".to_string(),
        }
    }
}

/// Message used when an error body carries neither `detail` nor `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorFallback {
    #[default]
    Generic,
    Login,
    Registration,
    Upload,
}

impl ErrorFallback {
    #[must_use]
    pub fn message(self, status: StatusCode) -> String {
        let code = status.as_u16();
        match self {
            Self::Generic => format!("Error {code}"),
            Self::Login => format!("Login failed ({code})"),
            Self::Registration => format!("Registration failed ({code})"),
            Self::Upload => format!("Upload failed ({code})"),
        }
    }
}

/// Extract the message from an error body: `detail` when it is a string,
/// the joined `msg` fields when it is a validation error list, then
/// `message`, then the fallback.
pub(crate) fn error_message(body: &str, status: StatusCode, fallback: ErrorFallback) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(body_message)
        .unwrap_or_else(|| fallback.message(status))
}

fn body_message(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => return Some(detail.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    body.get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string() {
        let message = error_message(
            r#"{"detail": "Incorrect email or password"}"#,
            StatusCode::UNAUTHORIZED,
            ErrorFallback::Login,
        );
        assert_eq!(message, "Incorrect email or password");
    }

    #[test]
    fn test_detail_validation_list() {
        let body = r#"{"detail": [
            {"loc": ["body", "email"], "msg": "value is not a valid email address"},
            {"loc": ["body", "password"], "msg": "field required"}
        ]}"#;
        let message = error_message(body, StatusCode::UNPROCESSABLE_ENTITY, ErrorFallback::Generic);
        assert_eq!(message, "value is not a valid email address; field required");
    }

    #[test]
    fn test_message_field() {
        let message = error_message(
            r#"{"message": "Cart is empty"}"#,
            StatusCode::BAD_REQUEST,
            ErrorFallback::Generic,
        );
        assert_eq!(message, "Cart is empty");
    }

    #[test]
    fn test_fallbacks() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(error_message("", status, ErrorFallback::Generic), "Error 500");
        assert_eq!(
            error_message("<html>", status, ErrorFallback::Login),
            "Login failed (500)"
        );
        assert_eq!(
            error_message(r#"{"detail": ""}"#, status, ErrorFallback::Registration),
            "Registration failed (500)"
        );
        assert_eq!(
            error_message("{}", StatusCode::PAYLOAD_TOO_LARGE, ErrorFallback::Upload),
            "Upload failed (413)"
        );
    }

    #[test]
    fn test_status_helpers() {
        let err = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "Not authenticated".to_string(),
        };
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Not authenticated");

        let err = ApiError::RateLimited { retry_after: 30 };
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert!(err.user_message().contains("30 seconds"));
    }
}
