//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, UserId};

/// A user as returned by `/auth/me`, `/users` and `/admin/users-full`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "super::timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Up to two uppercase initials, one per space-separated word.
    #[must_use]
    pub fn initials(&self) -> String {
        initials(&self.name)
    }

    /// Email hidden behind [`crate::types::email::mask_email`].
    #[must_use]
    pub fn masked_email(&self) -> String {
        self.email.masked()
    }

    /// Role label shown in user tables.
    #[must_use]
    pub const fn role_label(&self) -> &'static str {
        if self.is_admin { "Admin" } else { "User" }
    }
}

/// Initials for an avatar placeholder: `"ada king lovelace"` gives `"AK"`.
#[must_use]
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_nulls() {
        let json = r#"{
            "id": 3,
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "age": null,
            "is_admin": true,
            "avatar": null,
            "created_at": "2025-01-02T03:04:05.000001",
            "password_hash": "$2b$12$ignored"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(3));
        assert!(user.is_admin);
        assert!(user.age.is_none());
        assert!(user.created_at.is_some());
        assert_eq!(user.role_label(), "Admin");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Ada Lovelace"), "AL");
        assert_eq!(initials("ada king lovelace"), "AK");
        assert_eq!(initials("Cher"), "C");
        assert_eq!(initials(""), "");
        assert_eq!(initials("  double  space"), "DS");
    }
}
