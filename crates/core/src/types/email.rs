//! Email addresses and their masked display form.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string was rejected as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {} characters", Email::MAX_LENGTH)]
    TooLong,
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    #[error("email is missing the part before @")]
    EmptyLocalPart,
    #[error("email is missing the domain")]
    EmptyDomain,
}

/// An email address as users typed it, trimmed.
///
/// The backend decides what it accepts; this only rejects input that can
/// never be an address so forms fail without a round trip.
///
/// ```
/// use deadforest_core::Email;
///
/// assert!(Email::parse("ada@example.com").is_ok());
/// assert!(Email::parse("ada.example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// # Errors
    ///
    /// Returns an error for blank, overlong or `@`-less input.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }
        match trimmed.split_once('@').ok_or(EmailError::MissingAtSymbol)? {
            ("", _) => Err(EmailError::EmptyLocalPart),
            (_, "") => Err(EmailError::EmptyDomain),
            _ => Ok(Self(trimmed.to_owned())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// See [`mask_email`].
    #[must_use]
    pub fn masked(&self) -> String {
        mask_email(&self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mask an address for the user directory: `jonathan@example.com` becomes
/// `j******n@e******.com`.
///
/// The name keeps its first and last characters (one star minimum), the
/// first domain label keeps its first character and only the second label
/// is shown. Takes a plain string so rows with odd addresses still render.
#[must_use]
pub fn mask_email(email: &str) -> String {
    let (name, domain) = email.split_once('@').unwrap_or((email, ""));

    let chars: Vec<char> = name.chars().collect();
    let masked_name = match chars.as_slice() {
        [] => "*".to_owned(),
        [first] | [first, _] => format!("{first}*"),
        [first, .., last] => format!("{first}{}{last}", "*".repeat(chars.len() - 2)),
    };

    let mut labels = domain.split('.');
    let host = labels.next().unwrap_or("");
    let mut masked_domain = host.chars().next().map_or_else(
        || "*".to_owned(),
        |first| {
            let stars = host.chars().count().saturating_sub(1).max(1);
            format!("{first}{}", "*".repeat(stars))
        },
    );
    if let Some(tld) = labels.next().filter(|tld| !tld.is_empty()) {
        masked_domain.push('.');
        masked_domain.push_str(tld);
    }

    format!("{masked_name}@{masked_domain}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let email = Email::parse("  ada+shop@example.com ").unwrap();
        assert_eq!(email.as_str(), "ada+shop@example.com");
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at"), Err(EmailError::MissingAtSymbol));
        assert_eq!(Email::parse("@domain.com"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("ada@"), Err(EmailError::EmptyDomain));
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong));
    }

    #[test]
    fn test_mask_long_name() {
        assert_eq!(mask_email("jonathan@example.com"), "j******n@e******.com");
        let email = Email::parse("carol@shop.dev").unwrap();
        assert_eq!(email.masked(), "c***l@s***.dev");
    }

    #[test]
    fn test_mask_short_names() {
        assert_eq!(mask_email("ab@x.io"), "a*@x*.io");
        assert_eq!(mask_email("a@mail.org"), "a*@m***.org");
        assert_eq!(mask_email("bob@site.net"), "b*b@s***.net");
    }

    #[test]
    fn test_mask_ignores_labels_after_second() {
        assert_eq!(mask_email("amy@mail.example.com"), "a*y@m***.example");
    }

    #[test]
    fn test_mask_without_tld_or_domain() {
        assert_eq!(mask_email("root@localhost"), "r**t@l********");
        assert_eq!(mask_email("nobody"), "n****y@*");
    }
}
