//! Session-related types.
//!
//! Types stored in the visitor's session: identity, the backend session
//! token, currency preference, the guest cart, and one-shot flash messages.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use merlion_core::UserId;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
/// The backend session token lives under its own key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's backend ID.
    pub id: UserId,
    /// User's email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// A one-shot notice rendered on the next page load, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Visual tone of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

impl Flash {
    /// A success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// CSS class suffix for the notice banner.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "flash-success",
            FlashKind::Error => "flash-error",
        }
    }
}

/// Queue a flash message for the next rendered page.
///
/// Failures are logged and swallowed; losing a notice is not worth failing
/// the request that queued it.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(keys::FLASH, flash).await {
        tracing::warn!("Failed to store flash message: {}", e);
    }
}

/// Take the pending flash message, clearing it from the session.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session.remove::<Flash>(keys::FLASH).await.ok().flatten()
}

/// Session keys for visitor state.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the backend session token of the logged-in user.
    pub const BACKEND_TOKEN: &str = "backend_token";

    /// Key for the visitor's display currency code.
    pub const CURRENCY: &str = "currency";

    /// Key for the guest cart (signed-out visitors only).
    pub const GUEST_CART: &str = "guest_cart";

    /// Key for the one-shot flash message.
    pub const FLASH: &str = "flash";

    /// Key for the shopping assistant conversation ID.
    pub const CHAT_SESSION_ID: &str = "chat_session_id";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_constructors() {
        let flash = Flash::success("Order placed");
        assert_eq!(flash.kind, FlashKind::Success);
        assert_eq!(flash.css_class(), "flash-success");

        let flash = Flash::error("Could not remove item");
        assert_eq!(flash.kind, FlashKind::Error);
        assert_eq!(flash.css_class(), "flash-error");
    }

    #[test]
    fn test_current_user_serde_round_trip() {
        let user = CurrentUser {
            id: UserId::from("u1"),
            email: "wei@example.test".to_string(),
            name: "Wei Ming".to_string(),
        };
        let json = serde_json::to_string(&user).unwrap();
        let back: CurrentUser = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, user.id);
        assert_eq!(back.email, user.email);
    }
}
