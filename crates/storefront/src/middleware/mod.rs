//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri and request ID)
//! 3. Request ID (reuse or generate, forward to the backend)
//! 4. Security headers (CSP, frame, isolation)
//! 5. Session layer (tower-sessions with in-memory store, signed cookie)
//! 6. Token refresh (best-effort, once per request)
//! 7. Rate limiting on auth routes (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod token_refresh;

pub use auth::{
    OptionalAuth, RequireAdmin, RequireAuth, api_token, clear_api_token, set_api_token, set_flash,
    take_flash,
};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use token_refresh::token_refresh_middleware;
