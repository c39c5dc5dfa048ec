//! Public catalog endpoints.

use deadforest_core::ProductId;
use deadforest_core::catalog::StoreQuery;
use deadforest_core::models::Product;
use reqwest::Method;

use super::{ApiClient, ApiError, ErrorFallback};

/// `/products` endpoints. No token needed.
#[derive(Debug, Clone, Copy)]
pub struct ProductsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    #[must_use]
    pub const fn products(&self) -> ProductsApi<'_> {
        ProductsApi { client: self }
    }
}

impl ProductsApi<'_> {
    /// Active products matching the store filters. Multi-valued filters are
    /// sent as repeated parameters.
    pub async fn list(self, query: &StoreQuery) -> Result<Vec<Product>, ApiError> {
        let request = self
            .client
            .request(Method::GET, "products", None)?
            .query(&query.api_pairs());
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn get(self, id: ProductId) -> Result<Product, ApiError> {
        let request = self
            .client
            .request(Method::GET, &format!("products/{id}"), None)?;
        self.client.json(request, ErrorFallback::Generic).await
    }
}
