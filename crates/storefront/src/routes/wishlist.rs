//! Wishlist route handlers.
//!
//! The wishlist is account-only; product pages show a sign-in link in its
//! place for guests. Mutations come in over HTMX and respond with fragments.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use merlion_core::{CurrencyCode, ProductId};

use crate::error::Result;
use crate::filters;
use crate::middleware::{CurrencyPrefs, RequireAuth};
use crate::state::AppState;

pub use super::products::ProductCardView;

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: ProductId,
}

// =============================================================================
// Templates
// =============================================================================

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistIndexTemplate {
    pub products: Vec<ProductCardView>,
}

/// Wishlist grid fragment, swapped in after a removal.
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_items.html")]
pub struct WishlistItemsTemplate {
    pub products: Vec<ProductCardView>,
}

/// Save-for-later button fragment on product pages.
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: String,
    pub saved: bool,
}

async fn wishlist_cards(
    state: &AppState,
    token: &str,
    currency: CurrencyCode,
) -> Result<Vec<ProductCardView>> {
    let entries = state.api().wishlist(token).await?;
    Ok(entries
        .iter()
        .map(|entry| ProductCardView::from_product(&entry.product, currency))
        .collect())
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /wishlist - the signed-in user's saved products.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
) -> Result<Response> {
    let products = wishlist_cards(&state, &auth.token, currency).await?;
    Ok(WishlistIndexTemplate { products }.into_response())
}

/// POST /wishlist/add - HTMX endpoint saving a product.
///
/// Adding a product that is already saved is treated as success so the
/// button can be pressed twice without an error state.
#[instrument(skip(state, auth), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<WishlistForm>,
) -> Response {
    match state.api().add_to_wishlist(&auth.token, &form.product_id).await {
        Ok(_) => saved_button(&form.product_id),
        Err(e) if e.user_detail().is_some_and(|d| d.contains("already")) => {
            saved_button(&form.product_id)
        }
        Err(e) => {
            tracing::error!("Failed to add to wishlist: {}", e);
            Html("<span class=\"form-error\">Could not save this product</span>").into_response()
        }
    }
}

/// POST /wishlist/remove - HTMX endpoint dropping a product, responding
/// with the refreshed grid.
#[instrument(skip(state, auth), fields(product_id = %form.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
    Form(form): Form<WishlistForm>,
) -> Response {
    if let Err(e) = state
        .api()
        .remove_from_wishlist(&auth.token, &form.product_id)
        .await
    {
        tracing::error!("Failed to remove from wishlist: {}", e);
        return Html("<span class=\"form-error\">Could not remove this product</span>")
            .into_response();
    }

    match wishlist_cards(&state, &auth.token, currency).await {
        Ok(products) => WishlistItemsTemplate { products }.into_response(),
        Err(e) => {
            tracing::error!("Failed to reload wishlist: {}", e);
            WishlistItemsTemplate {
                products: Vec::new(),
            }
            .into_response()
        }
    }
}

fn saved_button(product_id: &ProductId) -> Response {
    WishlistButtonTemplate {
        product_id: product_id.to_string(),
        saved: true,
    }
    .into_response()
}
