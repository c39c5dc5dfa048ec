//! Integration tests for DeadForest.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p deadforest-integration-tests
//! ```
//!
//! No external services are needed. [`FakeBackend`] serves the part of the
//! DeadForest REST API that the storefront and CLI call, from memory, on an
//! ephemeral port. [`spawn_storefront`] runs the real storefront router
//! against it.
//!
//! ```rust,ignore
//! let backend = FakeBackend::spawn().await;
//! let storefront = spawn_storefront(&backend).await;
//! let client = browser();
//! client.post(format!("{storefront}/login")).form(&login_form).send().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use deadforest_core::logs::{LogQuery, matches_query};
use deadforest_core::models::LogEntry;
use deadforest_storefront::config::StorefrontConfig;
use deadforest_storefront::state::AppState;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

pub const ADMIN_EMAIL: &str = "ada@deadforest.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const USER_EMAIL: &str = "bob@deadforest.test";
pub const USER_PASSWORD: &str = "bob-pass";

/// Large enough for any upload the storefront forwards.
const UPLOAD_LIMIT: usize = 16 * 1024 * 1024;

const SESSION_SECRET: &str =
    "Wq8zR2nT5vY1bK9mX3cF7hJ0pL4sD6gA8eU2iO5tZ1yN7rM3wB9kV0xC6jH4fQ2s";

/// A user row held by the fake backend.
#[derive(Debug, Clone)]
struct FakeUser {
    id: i32,
    name: String,
    email: String,
    password: String,
    is_admin: bool,
    avatar: Option<String>,
}

impl FakeUser {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "age": null,
            "is_admin": self.is_admin,
            "avatar": self.avatar,
            "created_at": "2025-01-02T03:04:05",
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct CartRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    quantity: u32,
}

#[derive(Debug, Default)]
struct Store {
    users: Vec<FakeUser>,
    tokens: HashMap<String, i32>,
    reset_tokens: HashMap<String, i32>,
    products: Vec<Value>,
    cart: Vec<CartRow>,
    orders: Vec<(i32, Value)>,
    promo_codes: Vec<Value>,
    sales: Vec<Value>,
    uploads: Vec<FakeUpload>,
    sales_queries: Vec<HashMap<String, String>>,
    refresh_status: Option<StatusCode>,
    logs: Vec<LogEntry>,
    request_ids: Vec<String>,
    next_id: i32,
}

/// A file received on one of the upload endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeUpload {
    pub path: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

impl Store {
    fn seeded() -> Self {
        let mut store = Self {
            next_id: 100,
            ..Self::default()
        };
        store.users = vec![
            FakeUser {
                id: 1,
                name: "Ada Admin".to_owned(),
                email: ADMIN_EMAIL.to_owned(),
                password: ADMIN_PASSWORD.to_owned(),
                is_admin: true,
                avatar: None,
            },
            FakeUser {
                id: 2,
                name: "Bob Buyer".to_owned(),
                email: USER_EMAIL.to_owned(),
                password: USER_PASSWORD.to_owned(),
                is_admin: false,
                avatar: None,
            },
        ];
        store.products = vec![
            json!({
                "id": 1, "name": "Neon UI Kit", "description": "Dark dashboard components",
                "category": "UI Kits", "price": 49, "tags": "Dark,Web", "programs": "Figma",
                "rating": 4.5, "sales": 120, "status": "active",
            }),
            json!({
                "id": 2, "name": "Pixel Icons", "category": "Icon Sets", "price": 29.5,
                "tags": "Minimal", "programs": "Figma,Sketch", "rating": 4.0, "sales": 40,
                "status": "active",
            }),
            json!({
                "id": 3, "name": "Retired Pack", "category": "Templates", "price": 10,
                "status": "disabled",
            }),
            json!({
                "id": 4, "name": "Grain Brushes", "category": "Brushes", "price": 240,
                "programs": "Procreate", "rating": null, "sales": 0, "status": "active",
            }),
        ];
        store.orders = vec![(
            1,
            json!({
                "id": 42, "subtotal": 49, "discount": 0, "tax": 0, "total": 49,
                "status": "paid", "created_at": "2025-03-04T05:06:07",
                "items": [{ "id": 43, "product_id": 1, "quantity": 1, "price": 49 }],
            }),
        )];
        store.sales = vec![
            json!({ "bucket": "2025-02", "revenue": 120.0, "orders": 3 }),
            json!({ "bucket": "2025-03", "revenue": 49.0, "orders": 1 }),
        ];
        store.log("INFO", "app.startup", "Backend started", None, None);
        store.log("WARNING", "app.auth", "Slow login", Some("user.login"), Some(2));
        store
    }

    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn log(
        &mut self,
        level: &str,
        logger: &str,
        message: &str,
        event: Option<&str>,
        actor_id: Option<i64>,
    ) {
        let entry = json!({
            "timestamp": format!("2025-03-04T05:06:{:02}", self.logs.len() % 60),
            "level": level,
            "logger": logger,
            "message": message,
            "event": event,
            "actor_id": actor_id,
        });
        if let Ok(entry) = serde_json::from_value(entry) {
            self.logs.push(entry);
        }
    }

    fn product(&self, id: i32) -> Option<&Value> {
        self.products.iter().find(|p| p["id"] == id)
    }

    fn issue_token(&mut self, user_id: i32) -> String {
        let token = format!("token-{user_id}-{}", self.next_id());
        self.tokens.insert(token.clone(), user_id);
        token
    }

    fn user_for(&self, headers: &HeaderMap) -> Result<FakeUser, Response> {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token))
            .and_then(|id| self.users.iter().find(|u| u.id == *id))
            .cloned()
            .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }

    fn admin_for(&self, headers: &HeaderMap) -> Result<FakeUser, Response> {
        let user = self.user_for(headers)?;
        if user.is_admin {
            Ok(user)
        } else {
            Err(detail(StatusCode::FORBIDDEN, "Admin privileges required"))
        }
    }

    fn cart_json(&self, user_id: i32) -> Value {
        let mut subtotal = 0.0;
        let items: Vec<Value> = self
            .cart
            .iter()
            .filter(|row| row.user_id == user_id)
            .filter_map(|row| {
                let product = self.product(row.product_id)?;
                subtotal += product["price"].as_f64().unwrap_or(0.0) * f64::from(row.quantity);
                Some(json!({
                    "id": row.id,
                    "product": {
                        "id": product["id"],
                        "name": product["name"],
                        "price": product["price"],
                        "category": product["category"],
                    },
                    "quantity": row.quantity,
                }))
            })
            .collect();
        json!({ "items": items, "subtotal": subtotal, "total": subtotal })
    }
}

type Shared = Arc<Mutex<Store>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Store> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn json_or(result: Result<Value, Response>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(response) => response,
    }
}

/// In-memory stand-in for the DeadForest REST API.
pub struct FakeBackend {
    pub url: Url,
    store: Shared,
}

impl FakeBackend {
    /// Start the fake backend on `127.0.0.1` with an ephemeral port.
    pub async fn spawn() -> Self {
        let store: Shared = Arc::new(Mutex::new(Store::seeded()));
        let app = router(store.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: Url::parse(&format!("http://{addr}")).expect("Fake backend URL is valid"),
            store,
        }
    }

    /// Request IDs forwarded by callers, in arrival order.
    #[must_use]
    pub fn request_ids(&self) -> Vec<String> {
        lock(&self.store).request_ids.clone()
    }

    /// Orders placed so far by the user with `email`.
    #[must_use]
    pub fn orders_for(&self, email: &str) -> Vec<Value> {
        let store = lock(&self.store);
        let Some(user) = store.users.iter().find(|u| u.email == email) else {
            return Vec::new();
        };
        store
            .orders
            .iter()
            .filter(|(owner, _)| *owner == user.id)
            .map(|(_, order)| order.clone())
            .collect()
    }

    /// Whether the user with `email` currently has the admin role.
    #[must_use]
    pub fn is_admin(&self, email: &str) -> bool {
        lock(&self.store)
            .users
            .iter()
            .any(|u| u.email == email && u.is_admin)
    }

    #[must_use]
    pub fn log_count(&self) -> usize {
        lock(&self.store).logs.len()
    }

    /// A product row as the backend holds it, disabled ones included.
    #[must_use]
    pub fn product(&self, id: i32) -> Option<Value> {
        lock(&self.store).product(id).cloned()
    }

    #[must_use]
    pub fn product_named(&self, name: &str) -> Option<Value> {
        lock(&self.store)
            .products
            .iter()
            .find(|p| p["name"] == name)
            .cloned()
    }

    /// Files received on `/auth/avatar` and `/auth/product-image`.
    #[must_use]
    pub fn uploads(&self) -> Vec<FakeUpload> {
        lock(&self.store).uploads.clone()
    }

    #[must_use]
    pub fn avatar_for(&self, email: &str) -> Option<String> {
        lock(&self.store)
            .users
            .iter()
            .find(|u| u.email == email)
            .and_then(|u| u.avatar.clone())
    }

    /// Query parameters of every `/admin/sales-timeseries` call.
    #[must_use]
    pub fn sales_queries(&self) -> Vec<HashMap<String, String>> {
        lock(&self.store).sales_queries.clone()
    }

    /// Make `/auth/refresh` answer with `status` instead of a new token.
    pub fn fail_refresh_with(&self, status: StatusCode) {
        lock(&self.store).refresh_status = Some(status);
    }
}

/// Run the storefront against `backend`; returns its base URL.
pub async fn spawn_storefront(backend: &FakeBackend) -> String {
    let config =
        StorefrontConfig::for_api(backend.url.clone(), SecretString::from(SESSION_SECRET));
    let state = AppState::new(config).expect("Failed to build storefront state");
    let app = deadforest_storefront::app(state).expect("Failed to build storefront router");

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind storefront");
    let addr = listener.local_addr().expect("Storefront has no address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .ok();
    });

    format!("http://{addr}")
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location`.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Sign in through the storefront form.
pub async fn log_in(client: &reqwest::Client, storefront: &str, email: &str, password: &str) {
    let response = client
        .post(format!("{storefront}/login"))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .expect("Login request failed");
    assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[reqwest::header::LOCATION], "/users");
}

/// GET a page that must render, returning its HTML.
pub async fn page(client: &reqwest::Client, url: String) -> String {
    let response = client.get(url).send().await.expect("Page request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    response.text().await.expect("Page body unreadable")
}

// =============================================================================
// Routes
// =============================================================================

fn router(store: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/avatar", post(upload_avatar))
        .route("/auth/product-image", post(upload_product_image))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product).put(update_product))
        .route("/cart", get(get_cart).post(add_to_cart))
        .route("/cart/{id}", put(update_cart).delete(remove_from_cart))
        .route("/orders", get(list_orders).post(create_order))
        .route("/users", get(list_users))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/recent-orders", get(recent_orders))
        .route("/admin/top-products", get(top_products))
        .route("/admin/sales-timeseries", get(sales_timeseries))
        .route("/admin/products", get(admin_products))
        .route("/admin/products/{id}", delete(delete_product))
        .route("/admin/products/{id}/enable", post(enable_product))
        .route("/admin/products/{id}/disable", post(disable_product))
        .route("/admin/logs", get(admin_logs).delete(clear_logs))
        .route("/admin/users-full", get(list_users_full))
        .route("/admin/promote", post(promote))
        .route("/admin/demote", post(demote))
        .route("/admin/reset-password", post(admin_reset_password))
        .route("/admin/promo-codes", get(list_promo_codes).post(create_promo_code))
        .route("/admin/promo-codes/{id}", delete(delete_promo_code))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .layer(middleware::from_fn_with_state(store.clone(), record_request_id))
        .with_state(store)
}

async fn record_request_id(State(store): State<Shared>, request: Request, next: Next) -> Response {
    if let Some(id) = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
    {
        lock(&store).request_ids.push(id.to_owned());
    }
    next.run(request).await
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(State(store): State<Shared>, Form(form): Form<LoginForm>) -> Response {
    let mut store = lock(&store);
    let Some(user) = store
        .users
        .iter()
        .find(|u| u.email == form.username && u.password == form.password)
        .cloned()
    else {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    };
    let token = store.issue_token(user.id);
    store.log("INFO", "app.audit", "login", Some("user.login"), Some(user.id.into()));
    Json(json!({ "access_token": token, "token_type": "bearer" })).into_response()
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

async fn register(State(store): State<Shared>, Json(body): Json<RegisterBody>) -> Response {
    let mut store = lock(&store);
    if store.users.iter().any(|u| u.email == body.email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    let user = FakeUser {
        id: store.next_id(),
        name: body.name,
        email: body.email,
        password: body.password,
        is_admin: false,
        avatar: None,
    };
    let json = user.to_json();
    store.users.push(user);
    Json(json).into_response()
}

async fn refresh(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let mut store = lock(&store);
    if let Some(status) = store.refresh_status {
        return detail(status, "Could not refresh token");
    }
    json_or(store.user_for(&headers).map(|user| {
        json!({ "access_token": store.issue_token(user.id), "token_type": "bearer" })
    }))
}

async fn me(State(store): State<Shared>, headers: HeaderMap) -> Response {
    json_or(lock(&store).user_for(&headers).map(|u| u.to_json()))
}

#[derive(Deserialize)]
struct EmailBody {
    email: String,
}

async fn forgot_password(State(store): State<Shared>, Json(body): Json<EmailBody>) -> Response {
    let mut store = lock(&store);
    let Some(id) = store.users.iter().find(|u| u.email == body.email).map(|u| u.id) else {
        return Json(json!({ "message": "If the email exists, a reset link was sent" }))
            .into_response();
    };
    let token = format!("reset-{id}-{}", store.next_id());
    store.reset_tokens.insert(token.clone(), id);
    Json(json!({ "message": "Reset token issued", "reset_token": token })).into_response()
}

#[derive(Deserialize)]
struct ResetBody {
    token: String,
    new_password: String,
}

async fn reset_password(State(store): State<Shared>, Json(body): Json<ResetBody>) -> Response {
    let mut store = lock(&store);
    let Some(id) = store.reset_tokens.remove(&body.token) else {
        return detail(StatusCode::BAD_REQUEST, "Invalid or expired token");
    };
    if let Some(user) = store.users.iter_mut().find(|u| u.id == id) {
        user.password = body.new_password;
    }
    Json(json!({ "message": "Password updated" })).into_response()
}

async fn list_products(
    State(store): State<Shared>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let q = params
        .iter()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.to_lowercase());
    let categories: Vec<&str> = params
        .iter()
        .filter(|(k, _)| k == "categories")
        .map(|(_, v)| v.as_str())
        .collect();
    let number = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.parse::<f64>().ok())
    };
    let (min_price, max_price) = (number("min_price"), number("max_price"));
    let (min_rating, max_rating) = (number("min_rating"), number("max_rating"));

    let store = lock(&store);
    let products: Vec<Value> = store
        .products
        .iter()
        .filter(|p| p["status"] != "disabled")
        .filter(|p| {
            q.as_ref().is_none_or(|q| {
                p["name"]
                    .as_str()
                    .is_some_and(|name| name.to_lowercase().contains(q))
            })
        })
        .filter(|p| {
            categories.is_empty()
                || p["category"]
                    .as_str()
                    .is_some_and(|c| categories.contains(&c))
        })
        .filter(|p| {
            let price = p["price"].as_f64().unwrap_or(0.0);
            min_price.is_none_or(|min| price >= min) && max_price.is_none_or(|max| price <= max)
        })
        .filter(|p| {
            // A rating bound excludes unrated products, as SQL NULL comparisons do.
            let rating = p["rating"].as_f64();
            min_rating.is_none_or(|min| rating.is_some_and(|r| r >= min))
                && max_rating.is_none_or(|max| rating.is_some_and(|r| r <= max))
        })
        .cloned()
        .collect();
    Json(products).into_response()
}

async fn get_product(State(store): State<Shared>, Path(id): Path<i32>) -> Response {
    lock(&store).product(id).map_or_else(
        || detail(StatusCode::NOT_FOUND, "Product not found"),
        |p| Json(p.clone()).into_response(),
    )
}

async fn get_cart(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = lock(&store);
    json_or(store.user_for(&headers).map(|u| store.cart_json(u.id)))
}

#[derive(Deserialize)]
struct AddBody {
    product_id: i32,
    quantity: u32,
}

async fn add_to_cart(
    State(store): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<AddBody>,
) -> Response {
    let mut store = lock(&store);
    let user = match store.user_for(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if store.product(body.product_id).is_none() {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    }

    let existing = store
        .cart
        .iter_mut()
        .find(|row| row.user_id == user.id && row.product_id == body.product_id);
    let row = if let Some(row) = existing {
        row.quantity += body.quantity;
        *row
    } else {
        let row = CartRow {
            id: store.next_id(),
            user_id: user.id,
            product_id: body.product_id,
            quantity: body.quantity,
        };
        store.cart.push(row);
        row
    };
    Json(json!({ "id": row.id, "product_id": row.product_id, "quantity": row.quantity }))
        .into_response()
}

#[derive(Deserialize)]
struct QuantityBody {
    quantity: u32,
}

async fn update_cart(
    State(store): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<QuantityBody>,
) -> Response {
    let mut store = lock(&store);
    let user = match store.user_for(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(row) = store
        .cart
        .iter_mut()
        .find(|row| row.id == id && row.user_id == user.id)
    else {
        return detail(StatusCode::NOT_FOUND, "Cart item not found");
    };
    row.quantity = body.quantity;
    Json(json!({ "id": row.id, "product_id": row.product_id, "quantity": row.quantity }))
        .into_response()
}

async fn remove_from_cart(
    State(store): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    let mut store = lock(&store);
    let user = match store.user_for(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    store.cart.retain(|row| !(row.id == id && row.user_id == user.id));
    StatusCode::NO_CONTENT.into_response()
}

async fn list_orders(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = lock(&store);
    json_or(store.user_for(&headers).map(|user| {
        let orders: Vec<Value> = store
            .orders
            .iter()
            .filter(|(owner, _)| *owner == user.id)
            .map(|(_, order)| order.clone())
            .collect();
        json!(orders)
    }))
}

#[derive(Deserialize)]
struct OrderBody {
    items: Vec<AddBody>,
}

async fn create_order(
    State(store): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<OrderBody>,
) -> Response {
    let mut store = lock(&store);
    let user = match store.user_for(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if body.items.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "Order has no items");
    }

    let mut subtotal = 0.0;
    let mut items = Vec::new();
    for line in &body.items {
        let Some(price) = store.product(line.product_id).map(|p| p["price"].clone()) else {
            return detail(StatusCode::BAD_REQUEST, "Product not available");
        };
        subtotal += price.as_f64().unwrap_or(0.0) * f64::from(line.quantity);
        let id = store.next_id();
        items.push(json!({
            "id": id,
            "product_id": line.product_id,
            "quantity": line.quantity,
            "price": price,
        }));
    }

    let order = json!({
        "id": store.next_id(),
        "subtotal": subtotal,
        "discount": 0,
        "tax": 0,
        "total": subtotal,
        "status": "paid",
        "items": items,
    });
    store.cart.retain(|row| row.user_id != user.id);
    store.orders.push((user.id, order.clone()));
    store.log("INFO", "app.audit", "order placed", Some("order.create"), Some(user.id.into()));
    Json(order).into_response()
}

async fn list_users(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = lock(&store);
    json_or(
        store
            .user_for(&headers)
            .map(|_| json!(store.users.iter().map(FakeUser::to_json).collect::<Vec<_>>())),
    )
}

async fn list_users_full(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = lock(&store);
    json_or(store.admin_for(&headers).map(|_| {
        let users: Vec<Value> = store
            .users
            .iter()
            .map(|u| {
                let mut json = u.to_json();
                json["password_hash"] = json!("$2b$12$hidden");
                json
            })
            .collect();
        json!(users)
    }))
}

async fn admin_stats(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = lock(&store);
    json_or(store.admin_for(&headers).map(|_| {
        let revenue: f64 = store
            .orders
            .iter()
            .filter_map(|(_, order)| order["total"].as_f64())
            .sum();
        json!({
            "total_revenue": revenue,
            "total_orders": store.orders.len(),
            "active_products": store.products.iter().filter(|p| p["status"] == "active").count(),
            "page_views": 0,
        })
    }))
}

async fn admin_products(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = lock(&store);
    json_or(store.admin_for(&headers).map(|_| json!(store.products)))
}

#[derive(Deserialize)]
struct LogParams {
    limit: Option<u32>,
    event: Option<String>,
    actor_id: Option<i64>,
    target: Option<String>,
    extras: Option<String>,
}

async fn admin_logs(
    State(store): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<LogParams>,
) -> Response {
    let store = lock(&store);
    json_or(store.admin_for(&headers).map(|_| {
        let query = LogQuery::new(
            params.limit,
            params.event.as_deref(),
            params.actor_id,
            params.target.as_deref(),
            params.extras.as_deref(),
        );
        let limit = usize::try_from(query.limit()).unwrap_or(usize::MAX);
        let entries: Vec<&LogEntry> = store
            .logs
            .iter()
            .rev()
            .filter(|entry| matches_query(entry, &query))
            .take(limit)
            .collect();
        json!(entries)
    }))
}

async fn clear_logs(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let mut store = lock(&store);
    if let Err(response) = store.admin_for(&headers) {
        return response;
    }
    let removed = store.logs.len();
    store.logs.clear();
    Json(json!({ "status": "ok", "removed": removed })).into_response()
}

fn set_role(store: &Shared, headers: &HeaderMap, email: &str, is_admin: bool) -> Response {
    let mut store = lock(store);
    if let Err(response) = store.admin_for(headers) {
        return response;
    }
    let Some(user) = store.users.iter_mut().find(|u| u.email == email) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    user.is_admin = is_admin;
    let verb = if is_admin { "promoted to" } else { "removed from" };
    Json(json!({ "message": format!("{email} {verb} admin") })).into_response()
}

async fn promote(
    State(store): State<Shared>,
    headers: HeaderMap,
    Query(body): Query<EmailBody>,
) -> Response {
    set_role(&store, &headers, &body.email, true)
}

async fn demote(
    State(store): State<Shared>,
    headers: HeaderMap,
    Query(body): Query<EmailBody>,
) -> Response {
    set_role(&store, &headers, &body.email, false)
}

#[derive(Deserialize)]
struct NewPasswordBody {
    new_password: String,
}

async fn admin_reset_password(
    State(store): State<Shared>,
    headers: HeaderMap,
    Query(target): Query<EmailBody>,
    Json(body): Json<NewPasswordBody>,
) -> Response {
    let mut store = lock(&store);
    if let Err(response) = store.admin_for(&headers) {
        return response;
    }
    let Some(user) = store.users.iter_mut().find(|u| u.email == target.email) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    user.password = body.new_password;
    Json(json!({ "message": "Password reset" })).into_response()
}

async fn list_promo_codes(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = lock(&store);
    json_or(store.admin_for(&headers).map(|_| json!(store.promo_codes)))
}

async fn create_promo_code(
    State(store): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    let mut store = lock(&store);
    if let Err(response) = store.admin_for(&headers) {
        return response;
    }
    if store
        .promo_codes
        .iter()
        .any(|promo| promo["code"] == body["code"])
    {
        return detail(StatusCode::BAD_REQUEST, "Promo code already exists");
    }
    body["id"] = json!(store.next_id());
    body["uses"] = json!(0);
    store.promo_codes.push(body.clone());
    Json(body).into_response()
}

async fn delete_promo_code(
    State(store): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    let mut store = lock(&store);
    if let Err(response) = store.admin_for(&headers) {
        return response;
    }
    store.promo_codes.retain(|promo| promo["id"] != id);
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Uploads
// =============================================================================

/// Read the `file` part of an upload, recording it in the store.
async fn receive_file(
    store: &Shared,
    mut multipart: Multipart,
    directory: &str,
) -> Result<FakeUpload, Response> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|_| detail(StatusCode::BAD_REQUEST, "Upload interrupted"))?;
        let upload = FakeUpload {
            path: format!("/static/{directory}/{file_name}"),
            file_name,
            content_type,
            size: bytes.len(),
        };
        lock(store).uploads.push(upload.clone());
        return Ok(upload);
    }
    Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "No file uploaded"))
}

async fn upload_avatar(
    State(store): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let user = match lock(&store).user_for(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let upload = match receive_file(&store, multipart, "avatars").await {
        Ok(upload) => upload,
        Err(response) => return response,
    };
    let mut store = lock(&store);
    if let Some(row) = store.users.iter_mut().find(|u| u.id == user.id) {
        row.avatar = Some(upload.path.clone());
    }
    Json(json!({ "avatar": upload.path })).into_response()
}

async fn upload_product_image(
    State(store): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Err(response) = lock(&store).admin_for(&headers) {
        return response;
    }
    match receive_file(&store, multipart, "products").await {
        Ok(upload) => Json(json!({ "image_url": upload.path })).into_response(),
        Err(response) => response,
    }
}

// =============================================================================
// Product management
// =============================================================================

const PRODUCT_FIELDS: [&str; 9] = [
    "name",
    "description",
    "category",
    "price",
    "tags",
    "programs",
    "file_type",
    "image",
    "status",
];

async fn create_product(
    State(store): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut store = lock(&store);
    if let Err(response) = store.admin_for(&headers) {
        return response;
    }
    let mut product = json!({ "id": store.next_id(), "rating": null, "sales": 0 });
    for field in PRODUCT_FIELDS {
        product[field] = body[field].clone();
    }
    store.products.push(product.clone());
    Json(product).into_response()
}

async fn update_product(
    State(store): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = lock(&store);
    if let Err(response) = store.admin_for(&headers) {
        return response;
    }
    let Some(product) = store.products.iter_mut().find(|p| p["id"] == id) else {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    };
    for field in PRODUCT_FIELDS {
        if !body[field].is_null() {
            product[field] = body[field].clone();
        }
    }
    Json(product.clone()).into_response()
}

fn set_product_status(store: &Shared, headers: &HeaderMap, id: i32, status: &str) -> Response {
    let mut store = lock(store);
    if let Err(response) = store.admin_for(headers) {
        return response;
    }
    let Some(product) = store.products.iter_mut().find(|p| p["id"] == id) else {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    };
    product["status"] = json!(status);
    Json(json!({ "message": format!("Product {status}") })).into_response()
}

async fn enable_product(
    State(store): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    set_product_status(&store, &headers, id, "active")
}

async fn disable_product(
    State(store): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    set_product_status(&store, &headers, id, "disabled")
}

async fn delete_product(
    State(store): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    let mut store = lock(&store);
    if let Err(response) = store.admin_for(&headers) {
        return response;
    }
    if store.product(id).is_none() {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    }
    store.products.retain(|p| p["id"] != id);
    Json(json!({ "message": "Product deleted" })).into_response()
}

// =============================================================================
// Dashboard panels
// =============================================================================

async fn recent_orders(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = lock(&store);
    json_or(store.admin_for(&headers).map(|_| {
        let orders: Vec<Value> = store
            .orders
            .iter()
            .rev()
            .take(5)
            .map(|(owner, order)| {
                let customer = store
                    .users
                    .iter()
                    .find(|u| u.id == *owner)
                    .map_or("Guest", |u| u.email.as_str());
                json!({
                    "id": order["id"],
                    "customer": customer,
                    "total": order["total"],
                    "status": order["status"],
                    "created_at": order["created_at"],
                })
            })
            .collect();
        json!(orders)
    }))
}

async fn top_products(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = lock(&store);
    json_or(store.admin_for(&headers).map(|_| {
        let mut products: Vec<&Value> = store
            .products
            .iter()
            .filter(|p| p["sales"].as_u64().unwrap_or(0) > 0)
            .collect();
        products.sort_by_key(|p| std::cmp::Reverse(p["sales"].as_u64().unwrap_or(0)));
        let top: Vec<Value> = products
            .into_iter()
            .take(5)
            .map(|p| {
                let sales = p["sales"].as_u64().unwrap_or(0);
                #[allow(clippy::cast_precision_loss)]
                let revenue = p["price"].as_f64().unwrap_or(0.0) * sales as f64;
                json!({ "id": p["id"], "name": p["name"], "sales": sales, "revenue": revenue })
            })
            .collect();
        json!(top)
    }))
}

async fn sales_timeseries(
    State(store): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut store = lock(&store);
    if let Err(response) = store.admin_for(&headers) {
        return response;
    }
    store.sales_queries.push(params);
    Json(json!(store.sales)).into_response()
}
