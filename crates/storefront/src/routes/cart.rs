//! Cart route handlers.
//!
//! The cart lives in the backend; every action is a plain form POST that
//! redirects back with a flash message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use deadforest_core::models::{Cart, CartLine};
use deadforest_core::{CartItemId, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, set_flash};
use crate::models::Flash;
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub image_url: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl CartLineView {
    fn new(state: &AppState, line: &CartLine) -> Self {
        Self {
            id: line.id,
            product_id: line.product.id,
            name: line.product.name.clone(),
            category: line.product.category.clone(),
            image_url: state.image_url(line.product.image.as_deref()),
            price: line.product.price.display(),
            quantity: line.quantity,
            line_total: line.line_total().display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    pub total: String,
}

impl CartView {
    #[must_use]
    pub fn new(state: &AppState, cart: &Cart) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|line| CartLineView::new(state, line))
                .collect(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal.display(),
            total: cart.total.display(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    /// Page to come back to after adding.
    pub return_to: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub quantity: i64,
}

/// Only same-site absolute paths are followed; anything else goes to the
/// store.
#[must_use]
pub fn local_redirect_target(return_to: Option<&str>) -> &str {
    match return_to {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/store",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub layout: Layout,
    pub cart: Option<CartView>,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, session, token))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
) -> CartTemplate {
    let (layout, cart) = tokio::join!(
        Layout::load(&state, &session),
        state.api().cart(&token).get()
    );

    match cart {
        Ok(cart) => CartTemplate {
            layout,
            cart: Some(CartView::new(&state, &cart)),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart");
            CartTemplate {
                layout,
                cart: None,
                error: Some(e.user_message()),
            }
        }
    }
}

/// Add a product to the cart. Anonymous visitors are sent to log in first.
#[instrument(skip(state, session, token, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(token): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let Some(token) = token else {
        return Redirect::to("/login").into_response();
    };

    let quantity = form.quantity.filter(|q| *q >= 1).unwrap_or(1);
    match state.api().cart(&token).add(form.product_id, quantity).await {
        Ok(_) => {
            let product_id = form.product_id.to_string();
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
            set_flash(&session, Flash::success("Added to cart")).await;
        }
        Err(e) if e.is_unauthorized() => return Redirect::to("/login").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add to cart");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to(local_redirect_target(form.return_to.as_deref())).into_response()
}

/// Change a line's quantity. Quantities below one are ignored.
#[instrument(skip(state, session, token, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Form(form): Form<UpdateCartForm>,
) -> Redirect {
    let Ok(quantity) = u32::try_from(form.quantity) else {
        return Redirect::to("/cart");
    };
    if quantity < 1 {
        return Redirect::to("/cart");
    }

    if let Err(e) = state.api().cart(&token).update(item_id, quantity).await {
        tracing::warn!(error = %e, "Failed to update cart item");
        set_flash(&session, Flash::error(e.user_message())).await;
    }

    Redirect::to("/cart")
}

/// Remove a line from the cart.
#[instrument(skip(state, session, token))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Redirect {
    match state.api().cart(&token).remove(item_id).await {
        Ok(()) => set_flash(&session, Flash::success("Item removed")).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to remove cart item");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/cart")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_local_redirect_target() {
        assert_eq!(local_redirect_target(Some("/store?tags=Dark")), "/store?tags=Dark");
        assert_eq!(local_redirect_target(Some("/store/4")), "/store/4");
        assert_eq!(local_redirect_target(Some("//evil.example")), "/store");
        assert_eq!(local_redirect_target(Some("https://evil.example")), "/store");
        assert_eq!(local_redirect_target(Some("/\\evil.example")), "/store");
        assert_eq!(local_redirect_target(None), "/store");
    }

    #[test]
    fn test_update_form_accepts_zero_and_negative() {
        let form: UpdateCartForm = serde_json::from_str(r#"{"quantity": -2}"#).unwrap();
        assert_eq!(form.quantity, -2);
        assert!(u32::try_from(form.quantity).is_err());
    }
}
