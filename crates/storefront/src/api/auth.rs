//! Authentication and profile endpoints.

use deadforest_core::models::{
    AvatarResponse, ForgotPasswordResponse, MessageResponse, ProfileUpdate, Registration,
    TokenResponse, User,
};
use reqwest::Method;
use serde_json::json;

use super::{ApiClient, ApiError, ApiToken, ErrorFallback, Upload};

/// `/auth/*` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    #[must_use]
    pub const fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }
}

impl AuthApi<'_> {
    /// Exchange credentials for a token. The backend takes an OAuth2
    /// password form, so the email goes in `username`.
    pub async fn login(self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = self
            .client
            .request(Method::POST, "auth/login", None)?
            .form(&[("username", email), ("password", password)]);
        self.client.json(request, ErrorFallback::Login).await
    }

    pub async fn register(self, registration: &Registration) -> Result<User, ApiError> {
        let request = self
            .client
            .request(Method::POST, "auth/register", None)?
            .json(registration);
        self.client.json(request, ErrorFallback::Registration).await
    }

    /// Trade a still-valid token for a fresh one.
    pub async fn refresh(self, token: &ApiToken) -> Result<TokenResponse, ApiError> {
        let request = self.client.request(Method::POST, "auth/refresh", Some(token))?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn me(self, token: &ApiToken) -> Result<User, ApiError> {
        let request = self.client.request(Method::GET, "auth/me", Some(token))?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn update_me(self, token: &ApiToken, update: &ProfileUpdate) -> Result<User, ApiError> {
        let request = self
            .client
            .request(Method::PUT, "auth/me", Some(token))?
            .json(update);
        self.client.json(request, ErrorFallback::Generic).await
    }

    /// Upload a new avatar; returns the stored image path.
    pub async fn upload_avatar(self, token: &ApiToken, file: Upload) -> Result<AvatarResponse, ApiError> {
        let request = self
            .client
            .request(Method::POST, "auth/avatar", Some(token))?
            .multipart(file.into_form()?);
        self.client.json(request, ErrorFallback::Upload).await
    }

    pub async fn forgot_password(self, email: &str) -> Result<ForgotPasswordResponse, ApiError> {
        let request = self
            .client
            .request(Method::POST, "auth/forgot-password", None)?
            .json(&json!({ "email": email }));
        Ok(self
            .client
            .optional_json(request, ErrorFallback::Generic)
            .await?
            .unwrap_or_default())
    }

    pub async fn reset_password(
        self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let request = self
            .client
            .request(Method::POST, "auth/reset-password", None)?
            .json(&json!({ "token": reset_token, "new_password": new_password }));
        Ok(self
            .client
            .optional_json(request, ErrorFallback::Generic)
            .await?
            .unwrap_or_default())
    }
}
