//! Admin dashboard aggregates. All computed by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{OrderId, OrderStatus, Price, ProductId};

/// `GET /admin/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_revenue: Price,
    pub total_orders: u64,
    pub active_products: u64,
    #[serde(default)]
    pub page_views: u64,
}

/// `GET /admin/recent-orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentOrder {
    pub id: OrderId,
    /// Customer email, or `Guest`.
    pub customer: String,
    pub total: Price,
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "super::timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RecentOrder {
    /// Four-digit display number, e.g. `#0042`.
    #[must_use]
    pub fn number(&self) -> String {
        format!("#{:04}", self.id.as_i32())
    }
}

/// `GET /admin/top-products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub sales: u32,
    pub revenue: Price,
}

/// One bucket of `GET /admin/sales-timeseries`. `bucket` is whatever label
/// the database produced (`2025-03`, `2025-03-04T00:00:00`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub bucket: String,
    pub revenue: Price,
    pub orders: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_page_views_default() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{"total_revenue": 1234.5, "total_orders": 7, "active_products": 3}"#,
        )
        .unwrap();
        assert_eq!(stats.page_views, 0);
        assert_eq!(stats.total_revenue.display_compact(), "$1,234.5");
    }

    #[test]
    fn test_recent_order_guest() {
        let order: RecentOrder = serde_json::from_str(
            r#"{"id": 9, "customer": "Guest", "total": 20, "status": "pending", "created_at": null}"#,
        )
        .unwrap();
        assert_eq!(order.number(), "#0009");
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
