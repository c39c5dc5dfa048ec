//! Session middleware configuration.
//!
//! Sessions live in process memory; the cookie only carries a signed ID.
//! Restarting the storefront signs everyone out.

use secrecy::ExposeSecret;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::{ConfigError, StorefrontConfig};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "df_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session layer type used by the router.
pub type SessionLayer = SessionManagerLayer<MemoryStore, SignedCookie>;

/// Create the session layer with an in-memory store and a signed cookie.
///
/// # Errors
///
/// Returns an error if the session secret is too short to derive a signing key.
pub fn create_session_layer(config: &StorefrontConfig) -> Result<SessionLayer, ConfigError> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes()).map_err(|e| {
        ConfigError::InsecureSecret("STOREFRONT_SESSION_SECRET".to_string(), e.to_string())
    })?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use url::Url;

    use super::*;

    fn config(secret: &str) -> StorefrontConfig {
        StorefrontConfig::for_api(
            Url::parse("http://127.0.0.1:8000").unwrap(),
            SecretString::from(secret.to_string()),
        )
    }

    #[test]
    fn test_short_secret_is_rejected() {
        assert!(create_session_layer(&config("too-short")).is_err());
    }

    #[test]
    fn test_long_secret_builds_layer() {
        assert!(create_session_layer(&config(&"k3Y9".repeat(16))).is_ok());
    }
}
