//! Checkout: review the cart, then place the order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use deadforest_core::models::NewOrder;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{RequireAuth, set_flash};
use crate::models::Flash;
use crate::routes::cart::CartView;
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: Option<CartView>,
    pub error: Option<String>,
}

/// Display the order summary.
#[instrument(skip(state, session, token))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
) -> CheckoutTemplate {
    let (layout, cart) = tokio::join!(
        Layout::load(&state, &session),
        state.api().cart(&token).get()
    );

    let (cart, error) = match cart {
        Ok(cart) => (Some(CartView::new(&state, &cart)), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart for checkout");
            (None, Some(e.user_message()))
        }
    };

    CheckoutTemplate {
        layout,
        cart,
        error,
    }
}

/// Place an order for everything in the cart.
///
/// Totals come from the backend; only product IDs and quantities are sent.
/// Whether the cart is emptied afterwards is up to the backend.
#[instrument(skip(state, session, token))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
) -> Response {
    let api = state.api();

    let cart = match api.cart(&token).get().await {
        Ok(cart) => cart,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart for order");
            set_flash(&session, Flash::error(e.user_message())).await;
            return Redirect::to("/checkout").into_response();
        }
    };

    if cart.is_empty() {
        set_flash(&session, Flash::error("Your cart is empty")).await;
        return Redirect::to("/cart").into_response();
    }

    match api
        .orders(&token)
        .create(&NewOrder::from_items(cart.order_items()))
        .await
    {
        Ok(order) => {
            tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
            add_breadcrumb("checkout", "Order placed", None);
            set_flash(
                &session,
                Flash::success(format!("Order {} placed", order.number())),
            )
            .await;
            Redirect::to("/store").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Order creation failed");
            set_flash(&session, Flash::error(e.user_message())).await;
            Redirect::to("/checkout").into_response()
        }
    }
}
