//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use chrono::Utc;
use deadforest_core::SalesPeriod;
use deadforest_core::catalog::ProductCounts;
use deadforest_core::models::{DashboardStats, RecentOrder, TopProduct};
use deadforest_core::sales::{SalesChart, SalesRange};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminNav, AdminSection, load_layout};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Dashboard metrics.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub revenue: String,
    pub orders: String,
    pub active_products: String,
    /// Absent when the product list could not be loaded.
    pub disabled_products: Option<String>,
    pub page_views: String,
}

impl DashboardMetrics {
    fn new(stats: &DashboardStats, counts: Option<ProductCounts>) -> Self {
        Self {
            revenue: stats.total_revenue.display_compact(),
            orders: stats.total_orders.to_string(),
            active_products: stats.active_products.to_string(),
            disabled_products: counts.map(|c| c.disabled.to_string()),
            page_views: stats.page_views.to_string(),
        }
    }
}

/// Recent order view for dashboard.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub number: String,
    pub customer: String,
    pub total: String,
    pub status: String,
    pub status_class: &'static str,
    pub created_at: String,
}

impl From<&RecentOrder> for RecentOrderView {
    fn from(order: &RecentOrder) -> Self {
        Self {
            number: order.number(),
            customer: order.customer.clone(),
            total: order.total.display(),
            status: order.status.to_string(),
            status_class: order.status.badge_class(),
            created_at: deadforest_core::models::timestamp::display(order.created_at.as_ref()),
        }
    }
}

/// Top product view for dashboard.
#[derive(Debug, Clone)]
pub struct TopProductView {
    pub name: String,
    pub sales: u32,
    pub revenue: String,
}

impl From<&TopProduct> for TopProductView {
    fn from(product: &TopProduct) -> Self {
        Self {
            name: product.name.clone(),
            sales: product.sales,
            revenue: product.revenue.display_compact(),
        }
    }
}

/// A selectable chart option.
#[derive(Debug, Clone)]
pub struct ChartOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Chart selector query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub period: Option<String>,
    pub range: Option<String>,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub nav: AdminNav,
    pub metrics: Option<DashboardMetrics>,
    pub stats_error: Option<String>,
    pub chart: SalesChart,
    pub chart_error: Option<String>,
    pub periods: Vec<ChartOption>,
    pub ranges: Vec<ChartOption>,
    pub recent_orders: Vec<RecentOrderView>,
    pub orders_error: Option<String>,
    pub top_products: Vec<TopProductView>,
    pub top_error: Option<String>,
}

fn chart_options(period: SalesPeriod, range: SalesRange) -> (Vec<ChartOption>, Vec<ChartOption>) {
    let periods = SalesPeriod::ALL
        .iter()
        .map(|p| ChartOption {
            value: p.as_str(),
            label: p.label(),
            selected: *p == period,
        })
        .collect();
    let ranges = SalesRange::ALL
        .iter()
        .map(|r| ChartOption {
            value: r.as_str(),
            label: r.label(),
            selected: *r == range,
        })
        .collect();
    (periods, ranges)
}

/// Display the dashboard.
///
/// Stats, chart, recent orders, and top products are loaded concurrently;
/// each panel shows its own error.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Query(query): Query<DashboardQuery>,
) -> DashboardTemplate {
    let period: SalesPeriod = query
        .period
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or_default();
    let range = SalesRange::parse(query.range.as_deref());
    let (start, end) = range.bounds(Utc::now());

    let api = state.api().admin(&admin.token);
    let (layout, stats, sales, recent, top, products) = tokio::join!(
        load_layout(&state, &session, &admin),
        api.stats(),
        api.sales_timeseries(period, &start, &end),
        api.recent_orders(),
        api.top_products(),
        api.products(),
    );

    let counts = products
        .inspect_err(|e| tracing::debug!(error = %e, "Product counts unavailable"))
        .ok()
        .map(|products| ProductCounts::from_products(&products));

    let (metrics, stats_error) = match stats {
        Ok(stats) => (Some(DashboardMetrics::new(&stats, counts)), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load dashboard stats");
            (None, Some(e.user_message()))
        }
    };

    let (chart, chart_error) = match sales {
        Ok(points) => (SalesChart::from_points(&points), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load sales timeseries");
            (SalesChart::default(), Some(e.user_message()))
        }
    };

    let (recent_orders, orders_error) = match recent {
        Ok(orders) => (orders.iter().map(RecentOrderView::from).collect(), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load recent orders");
            (Vec::new(), Some(e.user_message()))
        }
    };

    let (top_products, top_error) = match top {
        Ok(products) => (products.iter().map(TopProductView::from).collect(), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load top products");
            (Vec::new(), Some(e.user_message()))
        }
    };

    let (periods, ranges) = chart_options(period, range);

    DashboardTemplate {
        layout,
        nav: AdminNav::new(AdminSection::Dashboard),
        metrics,
        stats_error,
        chart,
        chart_error,
        periods,
        ranges,
        recent_orders,
        orders_error,
        top_products,
        top_error,
    }
}
