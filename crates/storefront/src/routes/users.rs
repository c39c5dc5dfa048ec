//! User directory with role management.
//!
//! Emails are masked unless one row is explicitly revealed with
//! `?reveal=<user id>`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use deadforest_core::UserId;
use deadforest_core::models::User;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, ApiToken};
use crate::filters;
use crate::middleware::{RequireAdmin, set_flash};
use crate::models::Flash;
use crate::routes::layout::Layout;
use crate::state::AppState;

/// A row in a user table.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: UserId,
    pub name: String,
    pub initials: String,
    pub avatar_url: Option<String>,
    /// Full address when revealed, masked otherwise.
    pub email: String,
    /// Unmasked address, for role forms.
    pub email_raw: String,
    pub revealed: bool,
    pub is_admin: bool,
    pub role: &'static str,
    pub age: String,
    pub created_at: String,
    pub is_self: bool,
}

impl UserRow {
    #[must_use]
    pub fn new(state: &AppState, user: &User, reveal: Option<UserId>, current: UserId) -> Self {
        let revealed = reveal == Some(user.id);
        Self {
            id: user.id,
            name: user.name.clone(),
            initials: user.initials(),
            avatar_url: user
                .avatar
                .as_deref()
                .map(|avatar| state.image_url(Some(avatar))),
            email: if revealed {
                user.email.to_string()
            } else {
                user.masked_email()
            },
            email_raw: user.email.to_string(),
            revealed,
            is_admin: user.is_admin,
            role: user.role_label(),
            age: user.age.map(|age| age.to_string()).unwrap_or_default(),
            created_at: deadforest_core::models::timestamp::display(user.created_at.as_ref()),
            is_self: user.id == current,
        }
    }
}

/// Promote or demote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleAction {
    Promote,
    Demote,
}

impl RoleAction {
    /// Flash text on success.
    #[must_use]
    pub const fn done_message(self) -> &'static str {
        match self {
            Self::Promote => "User promoted to admin",
            Self::Demote => "Admin rights removed",
        }
    }

    /// Send the role change to the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    pub async fn apply(self, state: &AppState, token: &ApiToken, email: &str) -> Result<String, ApiError> {
        let admin = state.api().admin(token);
        let response = match self {
            Self::Promote => admin.promote(email).await?,
            Self::Demote => admin.demote(email).await?,
        };
        Ok(response
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.done_message().to_string()))
    }
}

/// Role change form data.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub email: String,
    pub action: RoleAction,
}

/// Query parameters for the user list.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub reveal: Option<UserId>,
}

/// Users page template.
#[derive(Template, WebTemplate)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub layout: Layout,
    pub users: Vec<UserRow>,
    pub error: Option<String>,
}

/// Display the user list. Admins only.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Query(query): Query<UsersQuery>,
) -> UsersTemplate {
    let (layout, users) = tokio::join!(
        Layout::for_user(&state, &session, &admin.token, &admin.user),
        state.api().users(&admin.token).list()
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

    UsersTemplate {
        layout,
        users,
        error,
    }
}

/// Promote or demote a user, then return to the list.
#[instrument(skip(state, session, admin, form))]
pub async fn change_role(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Form(form): Form<RoleForm>,
) -> Redirect {
    apply_role_change(&state, &session, &admin, &form).await;
    Redirect::to("/users")
}

/// Shared by `/users/role` and `/admin/users/role`.
pub async fn apply_role_change(state: &AppState, session: &Session, admin: &RequireAdmin, form: &RoleForm) {
    match form.action.apply(state, &admin.token, form.email.trim()).await {
        Ok(message) => {
            tracing::info!(admin_id = %admin.user.id, action = ?form.action, "Role changed");
            set_flash(session, Flash::success(message)).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Role change failed");
            set_flash(session, Flash::error(e.user_message())).await;
        }
    }
}
