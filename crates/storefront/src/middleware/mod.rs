//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for inline scripts)
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Security headers (nonce-based CSP, isolation headers)
//! 7. Rate limiting (governor, on auth/coupon/chat routes)

pub mod auth;
pub mod csp;
pub mod currency;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{Authed, OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use currency::{CurrencyPrefs, set_currency};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter, chat_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
