//! Layout fragment handlers.
//!
//! The base layout is static; everything session-dependent in it (account
//! links, currency label, flash notices) loads as an HTMX fragment so page
//! templates never thread session state through themselves.

use askama::Template;
use askama_web::WebTemplate;
use tower_sessions::Session;

use crate::middleware::{CurrencyPrefs, OptionalAuth};
use crate::models::{Flash, take_flash};

// =============================================================================
// Templates
// =============================================================================

/// Navbar account/currency fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/navbar.html")]
pub struct NavbarTemplate {
    pub user_name: Option<String>,
    pub currency_code: &'static str,
}

/// Flash notice fragment. Empty when nothing is queued.
#[derive(Template, WebTemplate)]
#[template(path = "partials/flash.html")]
pub struct FlashTemplate {
    pub flash: Option<Flash>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /partials/navbar - session-aware part of the navbar.
pub async fn navbar(
    OptionalAuth(auth): OptionalAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
) -> NavbarTemplate {
    NavbarTemplate {
        user_name: auth.map(|a| a.user.name),
        currency_code: currency.code(),
    }
}

/// GET /partials/flash - consume and render the pending flash notice.
pub async fn flash(session: Session) -> FlashTemplate {
    FlashTemplate {
        flash: take_flash(&session).await,
    }
}
