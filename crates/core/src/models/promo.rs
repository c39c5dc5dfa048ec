//! Promo codes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::PromoCodeId;

/// A promo code from `GET /admin/promo-codes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCode {
    pub id: PromoCodeId,
    pub code: String,
    /// Percentage off.
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub uses: u32,
    #[serde(default, deserialize_with = "super::timestamp::lenient")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, deserialize_with = "super::timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PromoCode {
    /// `uses / max_uses`, or `uses / ∞` for unlimited codes.
    #[must_use]
    pub fn usage(&self) -> String {
        self.max_uses.map_or_else(
            || format!("{} / ∞", self.uses),
            |max| format!("{} / {max}", self.uses),
        )
    }

    /// Whether the code can still be redeemed at `now`.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.expires_at.is_none_or(|expires| expires > now)
            && self.max_uses.is_none_or(|max| self.uses < max)
    }
}

/// Body for `POST /admin/promo-codes`. Build one through
/// [`crate::validation::validate_promo_code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPromoCode {
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}
