//! Order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use deadforest_core::models::Order;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Order row display data.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub number: String,
    pub status: String,
    pub status_class: &'static str,
    pub item_count: u32,
    pub subtotal: String,
    pub discount: Option<String>,
    pub tax: Option<String>,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.number(),
            status: order.status.to_string(),
            status_class: order.status.badge_class(),
            item_count: order.items.iter().map(|item| item.quantity).sum(),
            subtotal: order.subtotal.display(),
            discount: (!order.discount.is_zero()).then(|| order.discount.display()),
            tax: (!order.tax.is_zero()).then(|| order.tax.display()),
            total: order.total.display(),
        }
    }
}

/// Orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
    pub error: Option<String>,
}

/// Display the signed-in user's orders.
#[instrument(skip(state, session, token))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(token): RequireAuth,
) -> OrdersTemplate {
    let (layout, orders) = tokio::join!(
        Layout::load(&state, &session),
        state.api().orders(&token).list()
    );

    let (orders, error) = match orders {
        Ok(orders) => (orders.iter().map(OrderView::from).collect(), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders");
            (Vec::new(), Some(e.user_message()))
        }
    };

    OrdersTemplate {
        layout,
        orders,
        error,
    }
}
