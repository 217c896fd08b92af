//! Currency picker route handlers.
//!
//! Prices are stored in SGD and converted for display only, so switching
//! currency is a pure presentation change: store the preference and reload
//! the page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use merlion_core::CurrencyCode;

use crate::error::Result;
use crate::middleware::{CurrencyPrefs, set_currency};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// One entry in the currency dropdown.
pub struct CurrencyOptionView {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub selected: bool,
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CurrencyForm {
    pub currency: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Currency dropdown fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/currency_picker.html")]
pub struct CurrencyPickerTemplate {
    pub options: Vec<CurrencyOptionView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /partials/currency - the dropdown, with the session's choice selected.
pub async fn picker(CurrencyPrefs(current): CurrencyPrefs) -> CurrencyPickerTemplate {
    let options = CurrencyCode::ALL
        .iter()
        .map(|currency| CurrencyOptionView {
            code: currency.code(),
            symbol: currency.symbol(),
            name: currency.name(),
            selected: *currency == current,
        })
        .collect();

    CurrencyPickerTemplate { options }
}

/// POST /currency - switch the display currency.
///
/// Unknown codes fall back to SGD rather than erroring; the dropdown is
/// the only sender and always posts a known code.
#[instrument(skip(state, session, headers, form))]
pub async fn switch(
    State(state): State<AppState>,
    session: tower_sessions::Session,
    headers: HeaderMap,
    Form(form): Form<CurrencyForm>,
) -> Result<Response> {
    let currency = CurrencyCode::from_code(&form.currency);
    set_currency(&session, currency).await?;

    // HTMX senders get a full refresh so every price on the page converts;
    // plain form posts bounce back to where they came from.
    if headers.contains_key("hx-request") {
        return Ok((AppendHeaders([("HX-Refresh", "true")]), ()).into_response());
    }

    let referer = headers
        .get(axum::http::header::REFERER)
        .and_then(|v| v.to_str().ok());
    Ok(Redirect::to(same_origin_or_root(referer, &state.config().base_url)).into_response())
}

/// The referer when it points back at this site, `/` otherwise.
fn same_origin_or_root<'a>(referer: Option<&'a str>, base_url: &str) -> &'a str {
    let Some(referer) = referer else { return "/" };
    let local_path = referer.starts_with('/') && !referer.starts_with("//");
    if local_path || referer.starts_with(base_url.trim_end_matches('/')) {
        referer
    } else {
        "/"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picker_lists_every_currency_once() {
        let all: Vec<&str> = CurrencyCode::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(all.len(), 7);
        assert!(all.contains(&"SGD"));
        assert!(all.contains(&"INR"));
    }

    #[test]
    fn test_same_origin_or_root() {
        let base = "https://shop.example.com";
        assert_eq!(
            same_origin_or_root(Some("https://shop.example.com/products"), base),
            "https://shop.example.com/products"
        );
        assert_eq!(same_origin_or_root(Some("/products?page=2"), base), "/products?page=2");
        assert_eq!(same_origin_or_root(Some("https://evil.example/"), base), "/");
        assert_eq!(same_origin_or_root(Some("//evil.example"), base), "/");
        assert_eq!(same_origin_or_root(None, base), "/");
    }
}
