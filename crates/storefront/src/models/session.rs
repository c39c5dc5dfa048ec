//! Session-related types.
//!
//! The session holds the backend bearer token and the time of the last
//! request made with it. Nothing else about the user is cached; pages ask the
//! backend.

use serde::{Deserialize, Serialize};

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, FlashKind::Error)
    }
}

/// Session keys.
pub mod keys {
    /// Backend bearer token.
    pub const API_TOKEN: &str = "api_token";

    /// UTC timestamp of the last request made with the token.
    pub const LAST_ACTIVITY: &str = "last_activity";

    /// Pending [`super::Flash`] message.
    pub const FLASH: &str = "flash";
}
