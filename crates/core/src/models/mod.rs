//! Backend entities and request payloads.
//!
//! These mirror the JSON contract of the DeadForest API. The backend owns
//! validation; fields it may omit or null are `Option` with `#[serde(default)]`.

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod log;
pub mod order;
pub mod product;
pub mod promo;
pub mod timestamp;
pub mod user;

pub use analytics::{DashboardStats, RecentOrder, SalesPoint, TopProduct};
pub use auth::{
    AvatarResponse, ForgotPasswordResponse, ImageUploadResponse, MessageResponse, ProfileUpdate,
    Registration, TokenResponse,
};
pub use cart::{Cart, CartItem, CartLine, NewCartItem};
pub use log::{ClearLogsResponse, LogEntry};
pub use order::{NewOrder, Order, OrderItem, OrderLineInput};
pub use product::{Product, ProductPayload, ProductSummary};
pub use promo::{NewPromoCode, PromoCode};
pub use user::User;
