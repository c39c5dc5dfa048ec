//! Admin panel route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin), so
//! the backend confirms the role on each request.
//!
//! # Route Structure
//!
//! ```text
//! GET  /admin                          - Dashboard
//!
//! # Products
//! GET  /admin/products                 - Product table (search, status filter)
//! POST /admin/products                 - Create (multipart)
//! GET  /admin/products/new             - Create form
//! GET  /admin/products/{id}/edit       - Edit form
//! POST /admin/products/{id}            - Update (multipart)
//! POST /admin/products/{id}/toggle     - Enable or disable
//! GET  /admin/products/{id}/delete     - Delete confirmation
//! POST /admin/products/{id}/delete     - Delete
//!
//! # Promo codes
//! GET  /admin/promo                    - Table and create form
//! POST /admin/promo                    - Create
//! POST /admin/promo/{id}/delete        - Delete
//!
//! # Users
//! GET  /admin/users                    - Users table
//! POST /admin/users/role               - Promote or demote
//! POST /admin/users/reset-password     - Set a user's password
//!
//! # Logs
//! GET  /admin/logs                     - Log viewer
//! GET  /admin/logs/download            - Filtered entries as JSON
//! POST /admin/logs/clear               - Clear the backend buffer
//! ```

pub mod dashboard;
pub mod logs;
pub mod products;
pub mod promo;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::RequireAdmin;
use crate::routes::layout::Layout;
use crate::state::AppState;

/// Body limit for the product form. The attached product file is drained
/// without buffering and the image is capped while it is read, so this only
/// bounds how long a save may stream.
pub const PRODUCT_FORM_BODY_LIMIT: usize = 1024 * 1024 * 1024;

/// Sidebar section, for highlighting the active link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSection {
    Dashboard,
    Products,
    Promo,
    Users,
    Logs,
}

impl AdminSection {
    pub const ALL: [Self; 5] = [
        Self::Dashboard,
        Self::Products,
        Self::Promo,
        Self::Users,
        Self::Logs,
    ];

    #[must_use]
    pub const fn href(&self) -> &'static str {
        match self {
            Self::Dashboard => "/admin",
            Self::Products => "/admin/products",
            Self::Promo => "/admin/promo",
            Self::Users => "/admin/users",
            Self::Logs => "/admin/logs",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Products => "Products",
            Self::Promo => "Promo codes",
            Self::Users => "Users",
            Self::Logs => "Logs",
        }
    }
}

/// Admin sidebar. Admin templates render it next to the shared [`Layout`].
#[derive(Debug, Clone, Copy)]
pub struct AdminNav {
    pub section: AdminSection,
    pub sections: [AdminSection; 5],
}

impl AdminNav {
    #[must_use]
    pub const fn new(section: AdminSection) -> Self {
        Self {
            section,
            sections: AdminSection::ALL,
        }
    }

    #[must_use]
    pub fn is_active(&self, section: &AdminSection) -> bool {
        self.section == *section
    }
}

/// Shared layout for an admin page; the admin was already fetched by the
/// extractor, so only the cart badge is requested.
pub async fn load_layout(state: &AppState, session: &Session, admin: &RequireAdmin) -> Layout {
    Layout::for_user(state, session, &admin.token, &admin.user).await
}

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route(
            "/products",
            get(products::index)
                .post(products::create)
                .layer(DefaultBodyLimit::max(PRODUCT_FORM_BODY_LIMIT)),
        )
        .route("/products/new", get(products::new_form))
        .route(
            "/products/{id}",
            post(products::update)
                .layer(DefaultBodyLimit::max(PRODUCT_FORM_BODY_LIMIT)),
        )
        .route("/products/{id}/edit", get(products::edit_form))
        .route("/products/{id}/toggle", post(products::toggle))
        .route(
            "/products/{id}/delete",
            get(products::confirm_delete).post(products::delete),
        )
        .route("/promo", get(promo::index).post(promo::create))
        .route("/promo/{id}/delete", post(promo::delete))
        .route("/users", get(users::index))
        .route("/users/role", post(users::change_role))
        .route("/users/reset-password", post(users::reset_password))
        .route("/logs", get(logs::index))
        .route("/logs/download", get(logs::download))
        .route("/logs/clear", post(logs::clear))
}
