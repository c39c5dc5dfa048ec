//! Admin user management: roles and password resets.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use deadforest_core::models::User;
use deadforest_core::validation::check_password;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminNav, AdminSection, load_layout};
use crate::api::{ApiError, ApiToken};
use crate::filters;
use crate::middleware::{RequireAdmin, set_flash};
use crate::models::Flash;
use crate::routes::layout::Layout;
use crate::routes::users::{RoleForm, UserRow, UsersQuery, apply_role_change};
use crate::state::AppState;

/// Admin users template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct AdminUsersTemplate {
    pub layout: Layout,
    pub nav: AdminNav,
    pub users: Vec<UserRow>,
    pub error: Option<String>,
}

/// Password reset form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
    pub new_password: String,
}

/// The full listing, or the plain directory on backends without it.
async fn load_users(state: &AppState, token: &ApiToken) -> Result<Vec<User>, ApiError> {
    match state.api().admin(token).users_full().await {
        Ok(users) => Ok(users),
        Err(e) if e.is_unauthorized() => Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "Full user listing unavailable, using directory");
            state.api().users(token).list().await
        }
    }
}

/// Display the users table.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Query(query): Query<UsersQuery>,
) -> AdminUsersTemplate {
    let (layout, users) = tokio::join!(
        load_layout(&state, &session, &admin),
        load_users(&state, &admin.token)
    );

    let (users, error) = match users {
        Ok(users) => (
            users
                .iter()
                .map(|user| UserRow::new(&state, user, query.reveal, admin.user.id))
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load users");
            (Vec::new(), Some(e.user_message()))
        }
    };

    AdminUsersTemplate {
        layout,
        nav: AdminNav::new(AdminSection::Users),
        users,
        error,
    }
}

/// Promote or demote, then return to the table.
#[instrument(skip(state, session, admin, form))]
pub async fn change_role(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Form(form): Form<RoleForm>,
) -> Redirect {
    apply_role_change(&state, &session, &admin, &form).await;
    Redirect::to("/admin/users")
}

/// Set a new password for a user.
#[instrument(skip(state, session, admin, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Form(form): Form<ResetPasswordForm>,
) -> Redirect {
    if let Err(e) = check_password(&form.new_password) {
        set_flash(&session, Flash::error(e.to_string())).await;
        return Redirect::to("/admin/users");
    }

    let email = form.email.trim();
    match state
        .api()
        .admin(&admin.token)
        .reset_password(email, &form.new_password)
        .await
    {
        Ok(response) => {
            tracing::info!(admin_id = %admin.user.id, "Admin reset a user password");
            let message = response
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Password reset for {email}"));
            set_flash(&session, Flash::success(message)).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Admin password reset failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/admin/users")
}
