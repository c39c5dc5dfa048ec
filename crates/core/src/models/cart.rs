//! Shopping cart.

use serde::{Deserialize, Serialize};

use super::order::OrderLineInput;
use super::product::ProductSummary;
use crate::types::{CartItemId, Price, ProductId};

/// The expanded cart returned by `GET /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub subtotal: Price,
    #[serde(default)]
    pub total: Price,
}

/// One cart line with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product: ProductSummary,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }
}

impl Cart {
    /// Total number of units in the cart; drives the nav badge.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Order lines for checkout, one per cart line.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderLineInput> {
        self.items
            .iter()
            .map(|line| OrderLineInput {
                product_id: line.product.id,
                quantity: line.quantity,
            })
            .collect()
    }
}


/// A cart row as returned by `POST /cart` and `PUT /cart/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body for `POST /cart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        serde_json::from_str(
            r#"{
                "items": [
                    {"id": 10, "product": {"id": 1, "name": "Kit", "price": 49}, "quantity": 1},
                    {"id": 11, "product": {"id": 2, "name": "Icons", "price": 29.5, "category": "Icon Sets"}, "quantity": 2}
                ],
                "subtotal": 108,
                "total": 108
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_item_count_sums_quantities() {
        assert_eq!(cart().item_count(), 3);
        assert_eq!(Cart::default().item_count(), 0);
    }

    #[test]
    fn test_order_items() {
        let items = cart().order_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].product_id, ProductId::new(2));
        assert_eq!(items[1].quantity, 2);
    }

    #[test]
    fn test_line_total() {
        let cart = cart();
        assert_eq!(cart.items[1].line_total(), Price::from_cents(5900));
    }
}
