//! Authentication and profile payloads.

use serde::{Deserialize, Serialize};

/// `POST /auth/login` and `POST /auth/refresh` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: Option<u8>,
}

/// Partial `PUT /auth/me` body; only set fields are sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// `Some(None)` clears the age.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Option<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    /// An update that only changes the password.
    #[must_use]
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..Self::default()
        }
    }
}

/// `POST /auth/forgot-password` response. In development the backend
/// includes the reset token directly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForgotPasswordResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reset_token: Option<String>,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /auth/avatar` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

/// `POST /auth/product-image` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub image_url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_only_sends_set_fields() {
        let json = serde_json::to_value(ProfileUpdate::password("hunter22")).unwrap();
        assert_eq!(json, serde_json::json!({"password": "hunter22"}));
    }

    #[test]
    fn test_profile_update_can_clear_age() {
        let update = ProfileUpdate {
            name: Some("Ada".to_string()),
            age: Some(None),
            ..ProfileUpdate::default()
        };
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Ada", "age": null}));
    }

    #[test]
    fn test_token_type_default() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(token.token_type, "bearer");
    }
}
