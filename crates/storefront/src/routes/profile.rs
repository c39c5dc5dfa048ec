//! Profile page: details, password, and avatar.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, State},
    response::Redirect,
};
use deadforest_core::models::{ProfileUpdate, User};
use deadforest_core::validation::{
    AVATAR_MAX_BYTES, ProfileForm, ValidationError, check_avatar, check_password,
    validate_profile,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, set_flash};
use crate::models::Flash;
use crate::routes::layout::Layout;
use crate::routes::multipart::MultipartForm;
use crate::state::AppState;

/// Multipart field carrying the avatar image.
const AVATAR_FIELD: &str = "avatar";

/// Profile display data.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub age: String,
    pub initials: String,
    pub avatar_url: Option<String>,
    pub role: &'static str,
    pub member_since: String,
}

impl ProfileView {
    fn new(state: &AppState, user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            age: user.age.map(|age| age.to_string()).unwrap_or_default(),
            initials: user.initials(),
            avatar_url: user
                .avatar
                .as_deref()
                .map(|avatar| state.image_url(Some(avatar))),
            role: user.role_label(),
            member_since: deadforest_core::models::timestamp::display(user.created_at.as_ref()),
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub profile: ProfileView,
}

/// Profile details form data.
#[derive(Debug, Deserialize)]
pub struct ProfileDetailsForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: String,
}

/// Password change form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
    pub password_confirm: String,
}

/// Check a new password and its confirmation.
///
/// # Errors
///
/// Returns a mismatch before any length problem.
pub fn check_new_password(password: &str, confirm: &str) -> std::result::Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    check_password(password)
}

/// Display the profile page.
#[instrument(skip(state, session, token))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
) -> Result<ProfileTemplate> {
    let user = state.api().auth().me(&token).await?;
    let layout = Layout::for_user(&state, &session, &token, &user).await;

    Ok(ProfileTemplate {
        layout,
        profile: ProfileView::new(&state, &user),
    })
}

/// Update name, email, and age.
#[instrument(skip(state, session, token, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Form(form): Form<ProfileDetailsForm>,
) -> Result<Redirect> {
    let update = match validate_profile(&ProfileForm {
        name: &form.name,
        email: &form.email,
        age: &form.age,
    }) {
        Ok(update) => update,
        Err(e) => {
            set_flash(&session, Flash::error(e.to_string())).await;
            return Ok(Redirect::to("/profile"));
        }
    };

    match state.api().auth().update_me(&token, &update).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Profile updated");
            set_flash(&session, Flash::success("Profile updated")).await;
        }
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Profile update failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Ok(Redirect::to("/profile"))
}

/// Change the password.
#[instrument(skip(state, session, token, form))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Result<Redirect> {
    if let Err(e) = check_new_password(&form.password, &form.password_confirm) {
        set_flash(&session, Flash::error(e.to_string())).await;
        return Ok(Redirect::to("/profile"));
    }

    match state
        .api()
        .auth()
        .update_me(&token, &ProfileUpdate::password(form.password))
        .await
    {
        Ok(_) => {
            add_breadcrumb("auth", "Password changed", None);
            set_flash(&session, Flash::success("Password changed")).await;
        }
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Password change failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Ok(Redirect::to("/profile"))
}

/// Upload a new avatar after checking its type and size.
#[instrument(skip(state, session, token, multipart))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    multipart: Multipart,
) -> Result<Redirect> {
    let form = MultipartForm::read(multipart, AVATAR_FIELD, AVATAR_MAX_BYTES).await?;

    let Some(file) = form.file else {
        set_flash(&session, Flash::error("Choose an image to upload")).await;
        return Ok(Redirect::to("/profile"));
    };

    if let Err(e) = check_avatar(&file.file_name, file.size()) {
        set_flash(&session, Flash::error(e.to_string())).await;
        return Ok(Redirect::to("/profile"));
    }

    match state.api().auth().upload_avatar(&token, file).await {
        Ok(_) => set_flash(&session, Flash::success("Avatar updated")).await,
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Avatar upload failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Ok(Redirect::to("/profile"))
}
