//! The signed-in user's cart.

use deadforest_core::models::{Cart, CartItem, NewCartItem};
use deadforest_core::{CartItemId, ProductId};
use reqwest::Method;
use serde_json::json;

use super::{ApiClient, ApiError, ApiToken, ErrorFallback};

/// `/cart` endpoints for the token's owner.
#[derive(Debug, Clone, Copy)]
pub struct CartApi<'a> {
    client: &'a ApiClient,
    token: &'a ApiToken,
}

impl ApiClient {
    #[must_use]
    pub const fn cart<'a>(&'a self, token: &'a ApiToken) -> CartApi<'a> {
        CartApi {
            client: self,
            token,
        }
    }
}

impl CartApi<'_> {
    /// The expanded cart with product details and backend-computed totals.
    pub async fn get(self) -> Result<Cart, ApiError> {
        let request = self
            .client
            .request(Method::GET, "cart", Some(self.token))?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn add(self, product_id: ProductId, quantity: u32) -> Result<CartItem, ApiError> {
        let request = self
            .client
            .request(Method::POST, "cart", Some(self.token))?
            .json(&NewCartItem {
                product_id,
                quantity,
            });
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn update(self, item_id: CartItemId, quantity: u32) -> Result<CartItem, ApiError> {
        let request = self
            .client
            .request(Method::PUT, &format!("cart/{item_id}"), Some(self.token))?
            .json(&json!({ "quantity": quantity }));
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn remove(self, item_id: CartItemId) -> Result<(), ApiError> {
        let request = self
            .client
            .request(Method::DELETE, &format!("cart/{item_id}"), Some(self.token))?;
        self.client.empty(request, ErrorFallback::Generic).await
    }
}
