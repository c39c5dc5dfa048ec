//! Storefront-local models. Backend entities live in `deadforest_core::models`.

pub mod session;

pub use session::{Flash, FlashKind, keys as session_keys};
