//! Form validation run before a request reaches the backend.
//!
//! The backend re-validates everything; these checks only let a page show
//! an error without a round trip. Error messages are user-facing.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{NewPromoCode, ProfileUpdate};
use crate::types::Email;

/// Shortest password the backend accepts.
pub const PASSWORD_MIN: usize = 6;
/// Longest password the backend accepts (bcrypt input limit).
pub const PASSWORD_MAX: usize = 72;

/// Avatar size limit.
pub const AVATAR_MAX_BYTES: u64 = 2 * 1024 * 1024;
/// Product image size limit.
pub const PRODUCT_IMAGE_MAX_BYTES: u64 = 5 * 1024 * 1024;

const AVATAR_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

pub const NAME_MAX: usize = 100;
pub const AGE_MAX: u8 = 150;
pub const PROMO_CODE_MIN: usize = 3;
pub const PROMO_CODE_MAX: usize = 64;

/// A rejected form field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Password cannot be longer than 72 characters")]
    PasswordTooLong,
    #[error("Reset token is missing")]
    MissingResetToken,
    #[error("Unsupported file type. Use JPG, PNG, or WEBP.")]
    UnsupportedAvatarType,
    #[error("File too large ({}). Max 2MB.", format_bytes(*.0))]
    AvatarTooLarge(u64),
    #[error("Please select an image file")]
    NotAnImage,
    #[error("Image must be smaller than 5MB (got {})", format_bytes(*.0))]
    ImageTooLarge(u64),
    #[error("Selected file must be of type {0}")]
    WrongFileType(String),
    #[error("Code is required")]
    PromoCodeRequired,
    #[error("Code must be between 3 and 64 characters")]
    PromoCodeLength,
    #[error("Discount must be a non-negative number")]
    InvalidDiscount,
    #[error("Max uses must be a whole number of at least 1")]
    InvalidMaxUses,
    #[error("Expiry must be a valid date and time")]
    InvalidExpiry,
    #[error("Name is required")]
    NameRequired,
    #[error("Name cannot be longer than 100 characters")]
    NameTooLong,
    #[error("Enter a valid email address")]
    InvalidEmail,
    #[error("Age must be a whole number between 0 and 150")]
    InvalidAge,
}

/// Length checks shared by every password form.
///
/// # Errors
///
/// Returns [`ValidationError::PasswordTooShort`] or
/// [`ValidationError::PasswordTooLong`].
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > PASSWORD_MAX {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Checks for the reset-password form, in the order the page reports them.
///
/// # Errors
///
/// Returns the first failing check: mismatch, length, then missing token.
pub fn check_reset_passwords(
    password: &str,
    confirm: &str,
    token: Option<&str>,
) -> Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    check_password(password)?;
    if token.is_none_or(|t| t.trim().is_empty()) {
        return Err(ValidationError::MissingResetToken);
    }
    Ok(())
}

/// An avatar must be a PNG, JPEG or WEBP file of at most 2 MiB.
///
/// # Errors
///
/// Returns [`ValidationError::UnsupportedAvatarType`] or
/// [`ValidationError::AvatarTooLarge`].
pub fn check_avatar(filename: &str, size: u64) -> Result<(), ValidationError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !AVATAR_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::UnsupportedAvatarType);
    }
    if size > AVATAR_MAX_BYTES {
        return Err(ValidationError::AvatarTooLarge(size));
    }
    Ok(())
}

/// A product image must have an `image/*` content type and be under 5 MiB.
///
/// # Errors
///
/// Returns [`ValidationError::NotAnImage`] or
/// [`ValidationError::ImageTooLarge`].
pub fn check_product_image(content_type: Option<&str>, size: u64) -> Result<(), ValidationError> {
    if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return Err(ValidationError::NotAnImage);
    }
    if size > PRODUCT_IMAGE_MAX_BYTES {
        return Err(ValidationError::ImageTooLarge(size));
    }
    Ok(())
}

/// An attached product file must carry the selected extension.
///
/// # Errors
///
/// Returns [`ValidationError::WrongFileType`] when both are present and the
/// filename does not end with the file type.
pub fn check_product_file(
    file_type: Option<&str>,
    filename: Option<&str>,
) -> Result<(), ValidationError> {
    match (file_type.filter(|t| !t.is_empty()), filename) {
        (Some(file_type), Some(name))
            if !name
                .to_lowercase()
                .ends_with(&file_type.to_lowercase()) =>
        {
            Err(ValidationError::WrongFileType(file_type.to_owned()))
        }
        _ => Ok(()),
    }
}

/// Raw promo code form input.
#[derive(Debug, Clone, Default)]
pub struct PromoCodeForm<'a> {
    pub code: &'a str,
    pub discount: &'a str,
    pub max_uses: &'a str,
    /// `datetime-local` value such as `2025-03-04T10:20`.
    pub expires_at: &'a str,
}

/// Validate the promo form and build the request body.
///
/// Codes are trimmed and uppercased. A blank discount is zero. The expiry
/// has no zone and is taken as UTC.
///
/// # Errors
///
/// Returns the first invalid field.
pub fn validate_promo_code(form: &PromoCodeForm<'_>) -> Result<NewPromoCode, ValidationError> {
    let code = form.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(ValidationError::PromoCodeRequired);
    }
    let len = code.chars().count();
    if !(PROMO_CODE_MIN..=PROMO_CODE_MAX).contains(&len) {
        return Err(ValidationError::PromoCodeLength);
    }

    let discount = match form.discount.trim() {
        "" => Decimal::ZERO,
        raw => raw
            .parse::<Decimal>()
            .ok()
            .filter(|d| !d.is_sign_negative())
            .ok_or(ValidationError::InvalidDiscount)?,
    };

    let max_uses = match form.max_uses.trim() {
        "" => None,
        raw => Some(
            raw.parse::<u32>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or(ValidationError::InvalidMaxUses)?,
        ),
    };

    let expires_at = match form.expires_at.trim() {
        "" => None,
        raw => Some(parse_datetime_local(raw).ok_or(ValidationError::InvalidExpiry)?),
    };

    Ok(NewPromoCode {
        code,
        discount,
        max_uses,
        expires_at,
        is_active: true,
    })
}

/// Parse a `datetime-local` input value as UTC.
#[must_use]
pub fn parse_datetime_local(raw: &str) -> Option<DateTime<Utc>> {
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Raw profile form input.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm<'a> {
    pub name: &'a str,
    pub email: &'a str,
    /// Blank clears the age.
    pub age: &'a str,
}

/// Validate the profile form and build the `PUT /auth/me` body.
///
/// # Errors
///
/// Returns the first invalid field.
pub fn validate_profile(form: &ProfileForm<'_>) -> Result<ProfileUpdate, ValidationError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if name.chars().count() > NAME_MAX {
        return Err(ValidationError::NameTooLong);
    }

    let email = Email::parse(form.email).map_err(|_| ValidationError::InvalidEmail)?;
    let age = parse_age(form.age)?;

    Ok(ProfileUpdate {
        name: Some(name.to_owned()),
        email: Some(email.into_inner()),
        age: Some(age),
        ..ProfileUpdate::default()
    })
}

/// Parse an optional age field. Blank is `None`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidAge`] for anything outside `0..=150`.
pub fn parse_age(raw: &str) -> Result<Option<u8>, ValidationError> {
    match raw.trim() {
        "" => Ok(None),
        raw => raw
            .parse::<u8>()
            .ok()
            .filter(|age| *age <= AGE_MAX)
            .map(Some)
            .ok_or(ValidationError::InvalidAge),
    }
}

/// Human-readable byte size: `0 B`, `512 B`, `1.5 KB`, `2.0 MB`.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_owned();
    }
    let mut unit = 0;
    let mut whole = bytes;
    while whole >= 1024 && unit < UNITS.len() - 1 {
        whole /= 1024;
        unit += 1;
    }
    if unit == 0 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)] // display only
    let value = bytes as f64 / 1024_f64.powi(i32::try_from(unit).unwrap_or(0));
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_reset_passwords_order() {
        assert_eq!(
            check_reset_passwords("abc", "abd", None),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            check_reset_passwords("abc", "abc", None),
            Err(ValidationError::PasswordTooShort)
        );
        let long = "x".repeat(73);
        assert_eq!(
            check_reset_passwords(&long, &long, Some("t")),
            Err(ValidationError::PasswordTooLong)
        );
        assert_eq!(
            check_reset_passwords("secret1", "secret1", Some(" ")),
            Err(ValidationError::MissingResetToken)
        );
        assert!(check_reset_passwords("secret1", "secret1", Some("tok")).is_ok());
    }

    #[test]
    fn test_password_messages() {
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
        assert!(check_password(&"x".repeat(72)).is_ok());
    }

    #[test]
    fn test_avatar() {
        assert!(check_avatar("me.PNG", 1024).is_ok());
        assert!(check_avatar("me.jpeg", AVATAR_MAX_BYTES).is_ok());
        assert_eq!(
            check_avatar("me.gif", 10),
            Err(ValidationError::UnsupportedAvatarType)
        );
        assert_eq!(
            check_avatar("noext", 10),
            Err(ValidationError::UnsupportedAvatarType)
        );
        assert_eq!(
            check_avatar("me.webp", AVATAR_MAX_BYTES + 1),
            Err(ValidationError::AvatarTooLarge(AVATAR_MAX_BYTES + 1))
        );
        assert_eq!(
            ValidationError::AvatarTooLarge(3 * 1024 * 1024).to_string(),
            "File too large (3.0 MB). Max 2MB."
        );
    }

    #[test]
    fn test_product_image() {
        assert!(check_product_image(Some("image/png"), 100).is_ok());
        assert_eq!(
            check_product_image(Some("application/pdf"), 100),
            Err(ValidationError::NotAnImage)
        );
        assert_eq!(check_product_image(None, 100), Err(ValidationError::NotAnImage));
        assert_eq!(
            check_product_image(Some("image/jpeg"), PRODUCT_IMAGE_MAX_BYTES + 1),
            Err(ValidationError::ImageTooLarge(PRODUCT_IMAGE_MAX_BYTES + 1))
        );
        assert_eq!(
            ValidationError::ImageTooLarge(6 * 1024 * 1024).to_string(),
            "Image must be smaller than 5MB (got 6.0 MB)"
        );
    }

    #[test]
    fn test_product_file() {
        assert!(check_product_file(Some(".psd"), Some("Kit.PSD")).is_ok());
        assert!(check_product_file(None, Some("kit.zip")).is_ok());
        assert!(check_product_file(Some(".fig"), None).is_ok());
        let err = check_product_file(Some(".fig"), Some("kit.psd")).unwrap_err();
        assert_eq!(err.to_string(), "Selected file must be of type .fig");
    }

    #[test]
    fn test_promo_code() {
        let promo = validate_promo_code(&PromoCodeForm {
            code: "  spring25 ",
            discount: "12.5",
            max_uses: "10",
            expires_at: "2030-01-02T03:04",
        })
        .unwrap();
        assert_eq!(promo.code, "SPRING25");
        assert_eq!(promo.discount, Decimal::new(125, 1));
        assert_eq!(promo.max_uses, Some(10));
        assert_eq!(
            promo.expires_at,
            Some(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 0).unwrap())
        );
        assert!(promo.is_active);
    }

    #[test]
    fn test_promo_code_errors() {
        let form = |code, discount, max_uses, expires_at| PromoCodeForm {
            code,
            discount,
            max_uses,
            expires_at,
        };
        assert_eq!(
            validate_promo_code(&form(" ", "", "", "")),
            Err(ValidationError::PromoCodeRequired)
        );
        assert_eq!(
            validate_promo_code(&form("AB", "", "", "")),
            Err(ValidationError::PromoCodeLength)
        );
        assert_eq!(
            validate_promo_code(&form("ABC", "-1", "", "")),
            Err(ValidationError::InvalidDiscount)
        );
        assert_eq!(
            validate_promo_code(&form("ABC", "5", "0", "")),
            Err(ValidationError::InvalidMaxUses)
        );
        assert_eq!(
            validate_promo_code(&form("ABC", "5", "", "tomorrow")),
            Err(ValidationError::InvalidExpiry)
        );
        let promo = validate_promo_code(&form("abc", "", "", "")).unwrap();
        assert_eq!(promo.discount, Decimal::ZERO);
        assert_eq!(promo.max_uses, None);
    }

    #[test]
    fn test_profile() {
        let update = validate_profile(&ProfileForm {
            name: " Ada ",
            email: "ada@example.com",
            age: "",
        })
        .unwrap();
        assert_eq!(update.name.as_deref(), Some("Ada"));
        assert_eq!(update.age, Some(None));
        assert_eq!(update.password, None);

        let err = validate_profile(&ProfileForm {
            name: "Ada",
            email: "ada@example.com",
            age: "151",
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidAge);

        let err = validate_profile(&ProfileForm {
            name: "",
            email: "ada@example.com",
            age: "",
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::NameRequired);

        let err = validate_profile(&ProfileForm {
            name: "Ada",
            email: "nope",
            age: "",
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidEmail);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2.0 MB");
    }
}
