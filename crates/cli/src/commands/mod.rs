//! Command implementations.
//!
//! Every command logs in first and then talks to the backend through the
//! storefront's [`ApiClient`], so the CLI sees exactly what the web panel
//! sees.

pub mod logs;
pub mod promo;
pub mod sales;
pub mod users;

use std::time::Duration;

use deadforest_core::validation::ValidationError;
use deadforest_storefront::api::{AdminApi, ApiClient, ApiError, ApiToken, UsersApi};
use deadforest_storefront::config::{ConfigError, parse_api_url};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Backend request timeout for CLI calls.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// A credential was neither passed nor set in the environment.
    #[error("Missing {0}: pass --{1} or set {2}")]
    MissingCredential(&'static str, &'static str, &'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The signed-in account is not an admin.
    #[error("{0} is not an admin")]
    NotAdmin(String),
}

/// Connection settings shared by every command.
#[derive(Debug)]
pub struct Credentials {
    pub api_url: String,
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

/// A signed-in admin.
pub struct Session {
    client: ApiClient,
    token: ApiToken,
}

impl Session {
    /// Log in and confirm the account is an admin.
    ///
    /// # Errors
    ///
    /// Returns an error if a credential is missing, the URL is invalid, the
    /// login fails or the account lacks the admin role.
    pub async fn login(credentials: Credentials) -> Result<Self, CliError> {
        let email = credentials
            .email
            .ok_or(CliError::MissingCredential("email", "email", "DF_EMAIL"))?;
        let password = credentials.password.ok_or(CliError::MissingCredential(
            "password",
            "password",
            "DF_PASSWORD",
        ))?;

        let client = ApiClient::new(parse_api_url(&credentials.api_url)?, API_TIMEOUT)?;
        tracing::debug!(api_url = %client.base_url(), "Logging in");

        let response = client
            .auth()
            .login(email.trim(), password.expose_secret())
            .await?;
        let token = ApiToken::new(response.access_token);

        let me = client.auth().me(&token).await?;
        if !me.is_admin {
            return Err(CliError::NotAdmin(me.email.to_string()));
        }
        tracing::info!(user_id = %me.id, "Signed in as {}", me.email);

        Ok(Self { client, token })
    }

    #[must_use]
    pub fn admin(&self) -> AdminApi<'_> {
        self.client.admin(&self.token)
    }

    #[must_use]
    pub fn users(&self) -> UsersApi<'_> {
        self.client.users(&self.token)
    }
}
