//! Orders.

use serde::{Deserialize, Serialize};

use crate::types::{OrderId, OrderItemId, OrderStatus, Price, ProductId};

/// An order from `GET /orders` or the response of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub subtotal: Price,
    #[serde(default)]
    pub discount: Price,
    #[serde(default)]
    pub tax: Price,
    pub total: Price,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Four-digit display number, e.g. `#0042`.
    #[must_use]
    pub fn number(&self) -> String {
        format!("#{:04}", self.id.as_i32())
    }
}

/// A line of a placed order. The product may have been deleted since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub quantity: u32,
    pub price: Price,
}

/// A requested order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body for `POST /orders`. Pricing is computed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewOrder {
    pub items: Vec<OrderLineInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Price>,
}

impl NewOrder {
    #[must_use]
    pub const fn from_items(items: Vec<OrderLineInput>) -> Self {
        Self {
            items,
            discount: None,
            tax: None,
        }
    }
}
