//! Domain models for the storefront.
//!
//! Everything catalog- or order-shaped comes from the backend and lives in
//! [`crate::api::types`]; this module only holds what the storefront itself
//! owns, which is visitor session state.

pub mod session;

pub use session::{CurrentUser, Flash, FlashKind, set_flash, take_flash};
pub use session::keys as session_keys;
