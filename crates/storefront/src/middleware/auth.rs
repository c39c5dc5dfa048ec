//! Authentication extractors and session helpers.
//!
//! The bearer token issued by the backend lives in the server-side session.
//! These extractors read it back for route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use deadforest_core::models::User;
use tower_sessions::Session;

use crate::api::{ApiError, ApiToken};
use crate::error::AppError;
use crate::models::{Flash, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// If there is no token, returns a redirect to the login page (or 401 for
/// `/api/` paths).
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(State(state): State<AppState>, RequireAuth(token): RequireAuth) -> Result<Html<String>> {
///     let orders = state.api().orders(&token).list().await?;
///     ...
/// }
/// ```
pub struct RequireAuth(pub ApiToken);

/// Error returned when authentication is required but the user is not signed in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but not an admin.
    NotAdmin,
    /// The backend could not be asked who the user is.
    Api(ApiError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::NotAdmin => Redirect::to("/").into_response(),
            Self::Api(err) => AppError::Api(err).into_response(),
        }
    }
}

fn missing_token(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let token = api_token(session)
            .await
            .ok_or_else(|| missing_token(parts))?;

        Ok(Self(token))
    }
}

/// Extractor that optionally gets the current token.
///
/// Unlike `RequireAuth`, this does not reject anonymous requests.
pub struct OptionalAuth(pub Option<ApiToken>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => api_token(session).await,
            None => None,
        };

        Ok(Self(token))
    }
}

/// Extractor that requires an admin.
///
/// Asks the backend who the token belongs to. Anonymous users go to the
/// login page, a rejected token is dropped from the session, and non-admins
/// are sent home.
pub struct RequireAdmin {
    pub token: ApiToken,
    pub user: User,
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::Unauthorized)?;

        let token = api_token(&session)
            .await
            .ok_or_else(|| missing_token(parts))?;

        let user = match state.api().auth().me(&token).await {
            Ok(user) => user,
            Err(err) if err.is_unauthorized() => {
                if let Err(e) = clear_api_token(&session).await {
                    tracing::warn!(error = %e, "Failed to clear rejected token");
                }
                return Err(missing_token(parts));
            }
            Err(err) => return Err(AuthRejection::Api(err)),
        };

        if !user.is_admin {
            tracing::info!(user_id = %user.id, path = %parts.uri.path(), "Non-admin denied");
            return Err(AuthRejection::NotAdmin);
        }

        Ok(Self { token, user })
    }
}

// =============================================================================
// Session helpers
// =============================================================================

/// Read the token from the session. Session store errors count as signed out.
pub async fn api_token(session: &Session) -> Option<ApiToken> {
    session
        .get::<ApiToken>(session_keys::API_TOKEN)
        .await
        .ok()
        .flatten()
}

/// Store a freshly issued token and mark the session active.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_api_token(
    session: &Session,
    token: &ApiToken,
) -> Result<(), tower_sessions::session::Error> {
    // New identity, new session ID
    session.cycle_id().await?;
    session.insert(session_keys::API_TOKEN, token).await?;
    touch_activity(session).await
}

/// Replace the token after a refresh without rotating the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn replace_api_token(
    session: &Session,
    token: &ApiToken,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::API_TOKEN, token).await
}

/// Drop the token and activity timestamp (logout, or a 401 from the backend).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_api_token(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<ApiToken>(session_keys::API_TOKEN).await?;
    session
        .remove::<DateTime<Utc>>(session_keys::LAST_ACTIVITY)
        .await?;
    Ok(())
}

/// When the token was last used, if ever.
pub async fn last_activity(session: &Session) -> Option<DateTime<Utc>> {
    session
        .get::<DateTime<Utc>>(session_keys::LAST_ACTIVITY)
        .await
        .ok()
        .flatten()
}

/// Record that the token was just used.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn touch_activity(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::LAST_ACTIVITY, Utc::now())
        .await
}

/// Queue a message for the next rendered page.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let session = session();
        assert!(api_token(&session).await.is_none());

        set_api_token(&session, &ApiToken::new("t1")).await.unwrap();
        assert_eq!(api_token(&session).await, Some(ApiToken::new("t1")));
        assert!(last_activity(&session).await.is_some());

        clear_api_token(&session).await.unwrap();
        assert!(api_token(&session).await.is_none());
        assert!(last_activity(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = session();
        set_flash(&session, Flash::success("Saved")).await;
        assert_eq!(take_flash(&session).await, Some(Flash::success("Saved")));
        assert!(take_flash(&session).await.is_none());
    }

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");

        let response = AuthRejection::NotAdmin.into_response();
        assert_eq!(response.headers()["location"], "/");

        let response = AuthRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
