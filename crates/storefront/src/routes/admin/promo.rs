//! Promo code management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use deadforest_core::PromoCodeId;
use deadforest_core::models::PromoCode;
use deadforest_core::validation::{PromoCodeForm, validate_promo_code};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminNav, AdminSection, load_layout};
use crate::filters;
use crate::middleware::{RequireAdmin, set_flash};
use crate::models::Flash;
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Promo code row.
#[derive(Debug, Clone)]
pub struct PromoRow {
    pub id: PromoCodeId,
    pub code: String,
    pub discount: String,
    pub usage: String,
    pub expires_at: String,
    pub is_active: bool,
    pub redeemable: bool,
    pub created_at: String,
}

impl PromoRow {
    fn new(promo: &PromoCode, now: DateTime<Utc>) -> Self {
        Self {
            id: promo.id,
            code: promo.code.clone(),
            discount: format!("{}%", promo.discount.normalize()),
            usage: promo.usage(),
            expires_at: promo
                .expires_at
                .map_or_else(|| "Never".to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string()),
            is_active: promo.is_active,
            redeemable: promo.is_redeemable(now),
            created_at: deadforest_core::models::timestamp::display(promo.created_at.as_ref()),
        }
    }
}

/// Create form data, kept as text so a rejected form can be shown again.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPromoForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub discount: String,
    #[serde(default)]
    pub max_uses: String,
    #[serde(default)]
    pub expires_at: String,
}

/// Promo codes template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/promo.html")]
pub struct PromoTemplate {
    pub layout: Layout,
    pub nav: AdminNav,
    pub promos: Vec<PromoRow>,
    pub load_error: Option<String>,
    pub form: NewPromoForm,
    pub form_error: Option<String>,
}

async fn render(
    state: &AppState,
    session: &Session,
    admin: &RequireAdmin,
    form: NewPromoForm,
    form_error: Option<String>,
) -> PromoTemplate {
    let (layout, promos) = tokio::join!(
        load_layout(state, session, admin),
        state.api().admin(&admin.token).promo_codes()
    );

    let now = Utc::now();
    let (promos, load_error) = match promos {
        Ok(promos) => (promos.iter().map(|p| PromoRow::new(p, now)).collect(), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load promo codes");
            (Vec::new(), Some(e.user_message()))
        }
    };

    PromoTemplate {
        layout,
        nav: AdminNav::new(AdminSection::Promo),
        promos,
        load_error,
        form,
        form_error,
    }
}

/// Display promo codes and the create form.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
) -> PromoTemplate {
    render(&state, &session, &admin, NewPromoForm::default(), None).await
}

/// Create a promo code.
#[instrument(skip(state, session, admin, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Form(form): Form<NewPromoForm>,
) -> Response {
    let validated = validate_promo_code(&PromoCodeForm {
        code: &form.code,
        discount: &form.discount,
        max_uses: &form.max_uses,
        expires_at: &form.expires_at,
    });
    let promo = match validated {
        Ok(promo) => promo,
        Err(e) => {
            return render(&state, &session, &admin, form, Some(e.to_string()))
                .await
                .into_response();
        }
    };

    match state.api().admin(&admin.token).create_promo_code(&promo).await {
        Ok(created) => {
            tracing::info!(promo_id = %created.id, code = %created.code, "Promo code created");
            set_flash(&session, Flash::success(format!("Promo code {} created", created.code)))
                .await;
            Redirect::to("/admin/promo").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Promo code creation failed");
            render(&state, &session, &admin, form, Some(e.user_message()))
                .await
                .into_response()
        }
    }
}

/// Delete a promo code.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Path(id): Path<PromoCodeId>,
) -> Redirect {
    match state.api().admin(&admin.token).delete_promo_code(id).await {
        Ok(()) => {
            tracing::info!(promo_id = %id, "Promo code deleted");
            set_flash(&session, Flash::success("Promo code deleted")).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Promo code delete failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/admin/promo")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_promo_row_formatting() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let promo: PromoCode = serde_json::from_str(
            r#"{"id": 1, "code": "SPRING", "discount": 12.5, "max_uses": 10, "uses": 10,
                "expires_at": null, "is_active": true}"#,
        )
        .unwrap();
        let row = PromoRow::new(&promo, now);
        assert_eq!(row.discount, "12.5%");
        assert_eq!(row.usage, "10 / 10");
        assert_eq!(row.expires_at, "Never");
        assert!(!row.redeemable);
    }
}
