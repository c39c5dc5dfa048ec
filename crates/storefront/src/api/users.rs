//! User directory.

use deadforest_core::models::User;
use reqwest::Method;

use super::{ApiClient, ApiError, ApiToken, ErrorFallback};

#[derive(Debug, Clone, Copy)]
pub struct UsersApi<'a> {
    client: &'a ApiClient,
    token: &'a ApiToken,
}

impl ApiClient {
    #[must_use]
    pub const fn users<'a>(&'a self, token: &'a ApiToken) -> UsersApi<'a> {
        UsersApi {
            client: self,
            token,
        }
    }
}

impl UsersApi<'_> {
    pub async fn list(self) -> Result<Vec<User>, ApiError> {
        let request = self
            .client
            .request(Method::GET, "users", Some(self.token))?;
        self.client.json(request, ErrorFallback::Generic).await
    }
}
