//! HTTP middleware stack for the admin console.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, in-memory store)
//! 4. Security headers (static strict CSP)
//!
//! Authentication is an extractor, not a layer: every protected handler
//! takes [`RequireAdminAuth`], and the login routes simply don't.

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminAuthed, OptionalAdminAuth, RequireAdminAuth, clear_current_admin, set_current_admin,
};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
