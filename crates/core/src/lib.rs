//! DeadForest Core - Shared types and pure storefront logic.
//!
//! This crate provides the pieces used by every DeadForest component:
//! - `storefront` - Server-rendered storefront and admin panel
//! - `cli` - Command-line admin tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. All state is owned by the remote backend API; the types here
//! mirror its contract and implement the small amount of logic that happens
//! on our side (filtering, validation, formatting).
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`models`] - Backend entities and request payloads
//! - [`catalog`] - Store filter options, store queries, admin product search
//! - [`logs`] - Admin log filtering and aggregation
//! - [`validation`] - Form and upload validation
//! - [`sales`] - Dashboard sales ranges and chart scaling

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod logs;
pub mod models;
pub mod sales;
pub mod types;
pub mod validation;

pub use types::*;
