//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! df-cli users list
//! df-cli users promote ada@example.com
//! df-cli users demote ada@example.com
//! df-cli users reset-password ada@example.com --password hunter22
//! ```

use deadforest_core::models::User;
use deadforest_core::models::timestamp;
use deadforest_core::validation::check_password;

use super::{CliError, Session};

/// List every user, using the plain directory when the full listing is
/// unavailable.
pub async fn list(session: &Session) -> Result<(), CliError> {
    let users = match session.admin().users_full().await {
        Ok(users) => users,
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::debug!(error = %e, "Full user listing unavailable, using directory");
            session.users().list().await?
        }
    };

    tracing::info!("{} users", users.len());
    for user in &users {
        tracing::info!("{}", user_line(user));
    }
    Ok(())
}

fn user_line(user: &User) -> String {
    format!(
        "#{:<5} {:<8} {:<32} {} (joined {})",
        user.id,
        user.role_label(),
        user.email.as_str(),
        user.name,
        timestamp::display(user.created_at.as_ref()),
    )
}

/// Grant the admin role.
pub async fn promote(session: &Session, email: &str) -> Result<(), CliError> {
    let response = session.admin().promote(email.trim()).await?;
    tracing::info!(
        "{}",
        response
            .message
            .unwrap_or_else(|| format!("{} promoted to admin", email.trim()))
    );
    Ok(())
}

/// Remove the admin role.
pub async fn demote(session: &Session, email: &str) -> Result<(), CliError> {
    let response = session.admin().demote(email.trim()).await?;
    tracing::info!(
        "{}",
        response
            .message
            .unwrap_or_else(|| format!("Admin rights removed from {}", email.trim()))
    );
    Ok(())
}

/// Set a new password for a user.
pub async fn reset_password(session: &Session, email: &str, password: &str) -> Result<(), CliError> {
    check_password(password)?;
    let response = session
        .admin()
        .reset_password(email.trim(), password)
        .await?;
    tracing::info!(
        "{}",
        response
            .message
            .unwrap_or_else(|| format!("Password reset for {}", email.trim()))
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_line() {
        let user: User = serde_json::from_str(
            r#"{"id": 7, "name": "Ada", "email": "ada@example.com", "is_admin": true,
                "created_at": "2025-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        let line = user_line(&user);
        assert!(line.starts_with("#7"));
        assert!(line.contains("ada@example.com"));
        assert!(line.contains("2025-01-02 03:04"));
    }
}
