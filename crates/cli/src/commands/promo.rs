//! Promo code commands.
//!
//! # Usage
//!
//! ```bash
//! df-cli promo list
//! df-cli promo create SPRING --discount 15 --max-uses 100 --expires-at 2025-06-01T00:00
//! df-cli promo delete 3
//! ```

use chrono::Utc;
use deadforest_core::PromoCodeId;
use deadforest_core::validation::{PromoCodeForm, validate_promo_code};

use super::{CliError, Session};

/// List promo codes.
pub async fn list(session: &Session) -> Result<(), CliError> {
    let promos = session.admin().promo_codes().await?;
    let now = Utc::now();

    tracing::info!("{} promo codes", promos.len());
    for promo in &promos {
        let expires = promo
            .expires_at
            .map_or_else(|| "never".to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string());
        tracing::info!(
            "#{} {} {}% uses {} expires {}{}",
            promo.id,
            promo.code,
            promo.discount.normalize(),
            promo.usage(),
            expires,
            if promo.is_redeemable(now) { "" } else { " (not redeemable)" },
        );
    }
    Ok(())
}

/// Create a promo code. Inputs are validated the same way as the web form.
pub async fn create(
    session: &Session,
    code: &str,
    discount: &str,
    max_uses: Option<&str>,
    expires_at: Option<&str>,
) -> Result<(), CliError> {
    let promo = validate_promo_code(&PromoCodeForm {
        code,
        discount,
        max_uses: max_uses.unwrap_or_default(),
        expires_at: expires_at.unwrap_or_default(),
    })?;

    let created = session.admin().create_promo_code(&promo).await?;
    tracing::info!(promo_id = %created.id, "Promo code {} created", created.code);
    Ok(())
}

/// Delete a promo code.
pub async fn delete(session: &Session, id: PromoCodeId) -> Result<(), CliError> {
    session.admin().delete_promo_code(id).await?;
    tracing::info!(promo_id = %id, "Promo code deleted");
    Ok(())
}
