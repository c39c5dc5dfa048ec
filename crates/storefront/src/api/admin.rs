//! Back-office endpoints. Every call needs an admin token; the backend
//! answers 403 otherwise.

use deadforest_core::logs::LogQuery;
use deadforest_core::models::{
    ClearLogsResponse, DashboardStats, ImageUploadResponse, LogEntry, MessageResponse, NewPromoCode,
    Product, ProductPayload, PromoCode, RecentOrder, SalesPoint, TopProduct, User,
};
use deadforest_core::{ProductId, PromoCodeId, SalesPeriod};
use reqwest::Method;
use serde_json::json;

use super::{ApiClient, ApiError, ApiToken, ErrorFallback, Upload};

#[derive(Debug, Clone, Copy)]
pub struct AdminApi<'a> {
    client: &'a ApiClient,
    token: &'a ApiToken,
}

impl ApiClient {
    #[must_use]
    pub const fn admin<'a>(&'a self, token: &'a ApiToken) -> AdminApi<'a> {
        AdminApi {
            client: self,
            token,
        }
    }
}

impl AdminApi<'_> {
    fn request(self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, ApiError> {
        self.client.request(method, path, Some(self.token))
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub async fn stats(self) -> Result<DashboardStats, ApiError> {
        let request = self.request(Method::GET, "admin/stats")?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn recent_orders(self) -> Result<Vec<RecentOrder>, ApiError> {
        let request = self.request(Method::GET, "admin/recent-orders")?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn top_products(self) -> Result<Vec<TopProduct>, ApiError> {
        let request = self.request(Method::GET, "admin/top-products")?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    /// Revenue and order counts bucketed by `period` between two RFC 3339
    /// instants.
    pub async fn sales_timeseries(
        self,
        period: SalesPeriod,
        start: &str,
        end: &str,
    ) -> Result<Vec<SalesPoint>, ApiError> {
        let request = self.request(Method::GET, "admin/sales-timeseries")?.query(&[
            ("period", period.as_str()),
            ("start", start),
            ("end", end),
        ]);
        self.client.json(request, ErrorFallback::Generic).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Every product, disabled ones included, newest first.
    pub async fn products(self) -> Result<Vec<Product>, ApiError> {
        let request = self.request(Method::GET, "admin/products")?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn create_product(self, payload: &ProductPayload) -> Result<Product, ApiError> {
        let request = self.request(Method::POST, "products")?.json(payload);
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn update_product(
        self,
        id: ProductId,
        payload: &ProductPayload,
    ) -> Result<Product, ApiError> {
        let request = self
            .request(Method::PUT, &format!("products/{id}"))?
            .json(payload);
        self.client.json(request, ErrorFallback::Generic).await
    }

    /// Store a product image; returns the URL to put in the payload.
    pub async fn upload_product_image(self, file: Upload) -> Result<ImageUploadResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/product-image")?
            .multipart(file.into_form()?);
        self.client.json(request, ErrorFallback::Upload).await
    }

    pub async fn enable_product(self, id: ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &format!("admin/products/{id}/enable"))?;
        self.client.empty(request, ErrorFallback::Generic).await
    }

    pub async fn disable_product(self, id: ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &format!("admin/products/{id}/disable"))?;
        self.client.empty(request, ErrorFallback::Generic).await
    }

    pub async fn delete_product(self, id: ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("admin/products/{id}"))?;
        self.client.empty(request, ErrorFallback::Generic).await
    }

    // =========================================================================
    // Promo codes
    // =========================================================================

    pub async fn promo_codes(self) -> Result<Vec<PromoCode>, ApiError> {
        let request = self.request(Method::GET, "admin/promo-codes")?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn create_promo_code(self, promo: &NewPromoCode) -> Result<PromoCode, ApiError> {
        let request = self.request(Method::POST, "admin/promo-codes")?.json(promo);
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn delete_promo_code(self, id: PromoCodeId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("admin/promo-codes/{id}"))?;
        self.client.empty(request, ErrorFallback::Generic).await
    }

    // =========================================================================
    // Logs
    // =========================================================================

    /// Recent log records, newest first, filtered server-side.
    pub async fn logs(self, query: &LogQuery) -> Result<Vec<LogEntry>, ApiError> {
        let request = self.request(Method::GET, "admin/logs")?.query(&query.pairs());
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn clear_logs(self) -> Result<ClearLogsResponse, ApiError> {
        let request = self.request(Method::DELETE, "admin/logs")?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// All users with every column. Password hashes in the response are
    /// dropped during deserialization.
    pub async fn users_full(self) -> Result<Vec<User>, ApiError> {
        let request = self.request(Method::GET, "admin/users-full")?;
        self.client.json(request, ErrorFallback::Generic).await
    }

    pub async fn promote(self, email: &str) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "admin/promote")?
            .query(&[("email", email)]);
        Ok(self
            .client
            .optional_json(request, ErrorFallback::Generic)
            .await?
            .unwrap_or_default())
    }

    pub async fn demote(self, email: &str) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "admin/demote")?
            .query(&[("email", email)]);
        Ok(self
            .client
            .optional_json(request, ErrorFallback::Generic)
            .await?
            .unwrap_or_default())
    }

    /// Set a user's password without knowing the old one.
    pub async fn reset_password(
        self,
        email: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "admin/reset-password")?
            .query(&[("email", email)])
            .json(&json!({ "new_password": new_password }));
        Ok(self
            .client
            .optional_json(request, ErrorFallback::Generic)
            .await?
            .unwrap_or_default())
    }
}
