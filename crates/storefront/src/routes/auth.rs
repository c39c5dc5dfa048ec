//! Authentication route handlers.
//!
//! Handles login, registration, logout, and the password reset flow. The
//! backend issues bearer tokens; we keep them in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use deadforest_core::Email;
use deadforest_core::models::Registration;
use deadforest_core::validation::{ValidationError, check_password, check_reset_passwords, parse_age};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiToken;
use crate::error::{add_breadcrumb, clear_sentry_user};
use crate::filters;
use crate::middleware::{clear_api_token, set_api_token, set_flash};
use crate::models::Flash;
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Shown after a reset request whether or not the account exists.
pub const FORGOT_PASSWORD_DEFAULT_MESSAGE: &str = "If the email exists, a reset link has been sent";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub age: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub password_confirm: String,
    /// Hidden copy of the query token.
    pub token: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Set after a successful password reset.
    pub reset: Option<String>,
}

/// Query parameters for the reset page.
#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub age: String,
    pub error: Option<String>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub message: Option<String>,
    /// Direct reset link, only when the backend hands out the token.
    pub reset_link: Option<String>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub layout: Layout,
    pub token: String,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(state, session))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> LoginTemplate {
    LoginTemplate {
        layout: Layout::load(&state, &session).await,
        email: String::new(),
        error: None,
        success: query
            .reset
            .map(|_| "Password updated. Log in with your new password.".to_string()),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim();

    match state.api().auth().login(email, &form.password).await {
        Ok(token) => {
            if let Err(e) = set_api_token(&session, &ApiToken::new(token.access_token)).await {
                tracing::error!(error = %e, "Failed to store token in session");
                return login_failed(&state, &session, email, "Could not start a session").await;
            }
            add_breadcrumb("auth", "Logged in", None);
            tracing::info!("Login succeeded");
            Redirect::to("/users").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            login_failed(&state, &session, email, &e.user_message()).await
        }
    }
}

async fn login_failed(state: &AppState, session: &Session, email: &str, error: &str) -> Response {
    LoginTemplate {
        layout: Layout::load(state, session).await,
        email: email.to_string(),
        error: Some(error.to_string()),
        success: None,
    }
    .into_response()
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(state, session))]
pub async fn register_page(State(state): State<AppState>, session: Session) -> RegisterTemplate {
    RegisterTemplate {
        layout: Layout::load(&state, &session).await,
        name: String::new(),
        email: String::new(),
        age: String::new(),
        error: None,
    }
}

/// Check the registration form before it goes to the backend.
///
/// # Errors
///
/// Returns the first invalid field.
pub fn validate_registration(form: &RegisterForm) -> Result<Registration, ValidationError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    let email = Email::parse(&form.email).map_err(|_| ValidationError::InvalidEmail)?;
    check_password(&form.password)?;
    let age = parse_age(&form.age)?;

    Ok(Registration {
        name: name.to_string(),
        email: email.into_inner(),
        password: form.password.clone(),
        age,
    })
}

/// Handle registration form submission.
///
/// Creates the account, logs in with the same credentials, and sends the new
/// user to the store.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let registration = match validate_registration(&form) {
        Ok(registration) => registration,
        Err(e) => return register_failed(&state, &session, &form, e.to_string()).await,
    };

    let api = state.api();
    let user = match api.auth().register(&registration).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            return register_failed(&state, &session, &form, e.user_message()).await;
        }
    };
    tracing::info!(user_id = %user.id, "Account created");

    let token = match api
        .auth()
        .login(&registration.email, &registration.password)
        .await
    {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(error = %e, "Login after registration failed");
            set_flash(&session, Flash::success("Account created. Please log in.")).await;
            return Redirect::to("/login").into_response();
        }
    };

    if let Err(e) = set_api_token(&session, &ApiToken::new(token.access_token)).await {
        tracing::error!(error = %e, "Failed to store token in session");
        return Redirect::to("/login").into_response();
    }

    Redirect::to("/store").into_response()
}

async fn register_failed(
    state: &AppState,
    session: &Session,
    form: &RegisterForm,
    error: String,
) -> Response {
    RegisterTemplate {
        layout: Layout::load(state, session).await,
        name: form.name.clone(),
        email: form.email.clone(),
        age: form.age.clone(),
        error: Some(error),
    }
    .into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Forget the token and go home.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_api_token(&session).await {
        tracing::warn!(error = %e, "Failed to clear token on logout");
    }
    clear_sentry_user();
    Redirect::to("/")
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
#[instrument(skip(state, session))]
pub async fn forgot_password_page(
    State(state): State<AppState>,
    session: Session,
) -> ForgotPasswordTemplate {
    ForgotPasswordTemplate {
        layout: Layout::load(&state, &session).await,
        error: None,
        message: None,
        reset_link: None,
    }
}

/// Request a reset. The backend message is shown as-is; in development the
/// reset token comes back and is turned into a direct link.
#[instrument(skip(state, session, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> ForgotPasswordTemplate {
    let (layout, response) = tokio::join!(
        Layout::load(&state, &session),
        state.api().auth().forgot_password(form.email.trim())
    );

    match response {
        Ok(response) => ForgotPasswordTemplate {
            layout,
            error: None,
            message: Some(
                response
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| FORGOT_PASSWORD_DEFAULT_MESSAGE.to_string()),
            ),
            reset_link: response
                .reset_token
                .filter(|t| !t.is_empty())
                .map(|t| reset_link(&t)),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Forgot password request failed");
            ForgotPasswordTemplate {
                layout,
                error: Some(e.user_message()),
                message: None,
                reset_link: None,
            }
        }
    }
}

/// Local link to the reset page for a token.
#[must_use]
pub fn reset_link(token: &str) -> String {
    format!("/reset-password?token={}", urlencoding::encode(token))
}

/// Display the reset password page.
#[instrument(skip(state, session, query))]
pub async fn reset_password_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ResetQuery>,
) -> ResetPasswordTemplate {
    ResetPasswordTemplate {
        layout: Layout::load(&state, &session).await,
        token: query.token.unwrap_or_default(),
        error: None,
    }
}

/// Handle the reset password form.
#[instrument(skip(state, session, query, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ResetQuery>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let token = query
        .token
        .or(form.token)
        .filter(|t| !t.trim().is_empty());

    let error = match check_reset_passwords(&form.password, &form.password_confirm, token.as_deref())
    {
        Ok(()) => match token.as_deref() {
            Some(token) => match state.api().auth().reset_password(token, &form.password).await {
                Ok(_) => {
                    tracing::info!("Password reset completed");
                    return Redirect::to("/login?reset=1").into_response();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Password reset failed");
                    e.user_message()
                }
            },
            None => ValidationError::MissingResetToken.to_string(),
        },
        Err(e) => e.to_string(),
    };

    ResetPasswordTemplate {
        layout: Layout::load(&state, &session).await,
        token: token.unwrap_or_default(),
        error: Some(error),
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, password: &str, age: &str) -> RegisterForm {
        RegisterForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            age: age.to_string(),
        }
    }

    #[test]
    fn test_validate_registration() {
        let registration =
            validate_registration(&form(" Ada ", "ada@example.com", "secret1", "36")).unwrap();
        assert_eq!(registration.name, "Ada");
        assert_eq!(registration.age, Some(36));

        let registration =
            validate_registration(&form("Ada", "ada@example.com", "secret1", "")).unwrap();
        assert_eq!(registration.age, None);
    }

    #[test]
    fn test_validate_registration_errors() {
        assert_eq!(
            validate_registration(&form("", "ada@example.com", "secret1", "")),
            Err(ValidationError::NameRequired)
        );
        assert_eq!(
            validate_registration(&form("Ada", "not-an-email", "secret1", "")),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_registration(&form("Ada", "ada@example.com", "12345", "")),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_registration(&form("Ada", "ada@example.com", "secret1", "abc")),
            Err(ValidationError::InvalidAge)
        );
    }

    #[test]
    fn test_reset_link_encodes_token() {
        assert_eq!(reset_link("abc"), "/reset-password?token=abc");
        assert_eq!(reset_link("a+b/c"), "/reset-password?token=a%2Bb%2Fc");
    }
}
