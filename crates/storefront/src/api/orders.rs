//! Order history and checkout.

use deadforest_core::models::{NewOrder, Order};
use reqwest::Method;

use super::{ApiClient, ApiError, ApiToken, ErrorFallback};

/// `/orders` endpoints for the token's owner.
#[derive(Debug, Clone, Copy)]
pub struct OrdersApi<'a> {
    client: &'a ApiClient,
    token: &'a ApiToken,
}

impl ApiClient {
    #[must_use]
    pub const fn orders<'a>(&'a self, token: &'a ApiToken) -> OrdersApi<'a> {
        OrdersApi {
            client: self,
            token,
        }
    }
}

impl OrdersApi<'_> {
    pub async fn list(self) -> Result<Vec<Order>, ApiError> {
        let request = self
            .client
            .request(Method::GET, "orders", Some(self.token))?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    /// Place an order. Prices, discount and tax are computed by the backend.
    pub async fn create(self, order: &NewOrder) -> Result<Order, ApiError> {
        let request = self
            .client
            .request(Method::POST, "orders", Some(self.token))?
            .json(order);
        self.client.json(request, ErrorFallback::Generic).await
    }
}
