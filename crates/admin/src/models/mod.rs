//! Domain models for the admin console.
//!
//! Everything entity-shaped comes from the backend and lives in
//! [`crate::api::types`]; this module only holds what the console itself
//! owns, which is operator session state.

pub mod session;

pub use session::keys as session_keys;
pub use session::{CurrentAdmin, Flash, FlashKind, set_flash, take_flash};
