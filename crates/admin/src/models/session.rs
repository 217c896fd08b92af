//! Session-related types for admin authentication.
//!
//! The session holds the operator's identity, the backend session token,
//! and one-shot flash messages. Nothing else lives server-side.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use merlion_core::UserId;

/// Session-stored operator identity.
///
/// Minimal data stored in the session to identify the logged-in operator.
/// The backend session token lives under its own key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Operator's backend ID.
    pub id: UserId,
    /// Operator's email address.
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

/// Session keys for admin state.
pub mod keys {
    /// Key for storing the current logged-in operator.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the backend session token of the logged-in operator.
    pub const BACKEND_TOKEN: &str = "backend_token";

    /// Key for the one-shot flash message.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_css_classes() {
        assert_eq!(Flash::success("Saved").css_class(), "flash-success");
        assert_eq!(
            Flash::error("Coupon code already exists").css_class(),
            "flash-error"
        );
    }

    #[test]
    fn test_current_admin_serde_round_trip() {
        let admin = CurrentAdmin {
            id: UserId::from("adm-1"),
            email: "ops@merliongifts.sg".to_string(),
            name: "Ops".to_string(),
        };
        let json = serde_json::to_string(&admin).unwrap();
        let back: CurrentAdmin = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, admin.id);
        assert_eq!(back.email, admin.email);
    }
}
