//! Guest cart persistence.
//!
//! Signed-out visitors keep their cart in the session as a [`GuestCart`].
//! Session I/O failures degrade to an empty cart rather than a failed page;
//! the cart is a convenience, not a record.

use tower_sessions::Session;

use merlion_core::GuestCart;

use crate::models::session_keys;

/// Load the guest cart from the session, defaulting to empty.
pub async fn load_guest_cart(session: &Session) -> GuestCart {
    session
        .get::<GuestCart>(session_keys::GUEST_CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Persist the guest cart to the session.
pub async fn save_guest_cart(session: &Session, cart: &GuestCart) {
    if let Err(e) = session.insert(session_keys::GUEST_CART, cart).await {
        tracing::warn!("Failed to save guest cart: {}", e);
    }
}

/// Drop the guest cart from the session.
pub async fn clear_guest_cart(session: &Session) {
    if let Err(e) = session.remove::<GuestCart>(session_keys::GUEST_CART).await {
        tracing::warn!("Failed to clear guest cart: {}", e);
    }
}
