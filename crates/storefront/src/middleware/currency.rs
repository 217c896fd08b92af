//! Display currency extractor.
//!
//! The visitor's currency preference lives in the session. Prices are
//! quoted in SGD by the backend and converted at display time, so every
//! page handler takes this extractor and passes the currency down to its
//! view builders.

use axum::{extract::FromRequestParts, http::request::Parts};
use merlion_core::CurrencyCode;
use tower_sessions::Session;

use crate::models::session_keys;

/// The visitor's chosen display currency, defaulting to SGD.
///
/// # Example
///
/// ```rust,ignore
/// async fn listing(CurrencyPrefs(currency): CurrencyPrefs) -> impl IntoResponse {
///     let price = currency.format(product.price);
///     /* ... */
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrencyPrefs(pub CurrencyCode);

impl<S> FromRequestParts<S> for CurrencyPrefs
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(CurrencyCode::default()));
        };

        let stored: Option<String> = session
            .get(session_keys::CURRENCY)
            .await
            .ok()
            .flatten();

        // Unknown or missing codes quietly fall back to SGD
        Ok(Self(
            stored
                .as_deref()
                .map(CurrencyCode::from_code)
                .unwrap_or_default(),
        ))
    }
}

/// Store the visitor's display currency in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_currency(
    session: &Session,
    currency: CurrencyCode,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENCY, currency.code())
        .await
}
