//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Store
//! GET  /store                  - Catalog (filters, sort, pagination)
//! GET  /store/{id}             - Product detail
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart
//! POST /cart/{id}/update       - Change quantity
//! POST /cart/{id}/remove       - Remove line
//!
//! # Checkout & orders (requires auth)
//! GET  /checkout               - Order summary
//! POST /checkout               - Place order
//! GET  /orders                 - Order history
//!
//! # Auth (POSTs are rate limited)
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! POST /logout                 - Logout action
//! GET  /forgot-password        - Forgot password page
//! POST /forgot-password        - Request a reset token
//! GET  /reset-password         - Reset password page (?token=)
//! POST /reset-password         - Set the new password
//!
//! # Profile (requires auth)
//! GET  /profile                - Profile page
//! POST /profile                - Update name, email, age
//! POST /profile/password       - Change password
//! POST /profile/avatar         - Upload avatar (multipart)
//!
//! # Users (requires admin)
//! GET  /users                  - User directory (?reveal=<id>)
//! POST /users/role             - Promote or demote
//!
//! # Admin (requires admin)
//! /admin/...                   - See [`admin`]
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod layout;
pub mod multipart;
pub mod orders;
pub mod profile;
pub mod store;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use deadforest_core::validation::AVATAR_MAX_BYTES;

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Room for the multipart framing and text fields around an upload.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Request body limit for a multipart form carrying a file of at most
/// `max_file_bytes`.
#[must_use]
pub fn multipart_body_limit(max_file_bytes: u64) -> usize {
    usize::try_from(max_file_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES)
}

/// Liveness health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(store::index))
        .route("/{id}", get(store::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/{id}/update", post(cart::update))
        .route("/{id}/remove", post(cart::remove))
}

/// Create the auth routes router. Form submissions share one limiter, so the
/// budget is per client across all four endpoints.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter.clone())),
        )
        .route("/logout", post(auth::logout))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page)
                .merge(post(auth::forgot_password).layer(limiter.clone())),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page).merge(post(auth::reset_password).layer(limiter)),
        )
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .route("/password", post(profile::change_password))
        .route(
            "/avatar",
            post(profile::upload_avatar)
                .layer(DefaultBodyLimit::max(multipart_body_limit(AVATAR_MAX_BYTES))),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .nest("/store", store_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .route("/orders", get(orders::index))
        .merge(auth_routes())
        .nest("/profile", profile_routes())
        .route("/users", get(users::index))
        .route("/users/role", post(users::change_role))
        .nest("/admin", admin::routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_body_limit_adds_headroom() {
        assert_eq!(multipart_body_limit(1024), 1024 + MULTIPART_OVERHEAD_BYTES);
        assert_eq!(multipart_body_limit(u64::MAX), usize::MAX);
    }
}
