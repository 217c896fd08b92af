//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Signed-in visitors operate on the backend cart; guests operate on the
//! session cart, which is merged into the backend cart at sign-in.

use std::num::NonZeroU32;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use merlion_core::{CartItemId, CurrencyCode, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::api::CartEntry;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{Authed, CurrencyPrefs, OptionalAuth};
use crate::services::cart::{EXPLORE_COLLECTION, GuestCartLine, hydrate_guest_cart};
use crate::services::guest_cart::{load_guest_cart, save_guest_cart};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    /// Backend cart row id for signed-in visitors, guest line id otherwise.
    pub line_id: String,
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    /// Set when the line came from a themed collection page.
    pub from_explore: bool,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty(currency: CurrencyCode) -> Self {
        Self {
            items: Vec::new(),
            subtotal: currency.format(rust_decimal::Decimal::ZERO),
            item_count: 0,
        }
    }

    fn from_entries(entries: &[CartEntry], currency: CurrencyCode) -> Self {
        let mut items = Vec::with_capacity(entries.len());
        let mut subtotal = rust_decimal::Decimal::ZERO;
        let mut count = 0u32;

        for entry in entries {
            let unit = entry.product.effective_price();
            let line = unit * rust_decimal::Decimal::from(entry.cart_item.quantity);
            subtotal += line;
            count = count.saturating_add(entry.cart_item.quantity);
            items.push(CartItemView {
                line_id: entry.cart_item.id.to_string(),
                product_id: entry.product.id.to_string(),
                name: entry.product.name.clone(),
                image: entry.product.primary_image().map(String::from),
                quantity: entry.cart_item.quantity,
                unit_price: currency.convert_and_format(unit),
                line_total: currency.convert_and_format(line),
                from_explore: entry.product.landmark_id.is_some(),
            });
        }

        Self {
            items,
            subtotal: currency.convert_and_format(subtotal),
            item_count: count,
        }
    }

    fn from_guest_lines(lines: &[GuestCartLine], currency: CurrencyCode) -> Self {
        let mut items = Vec::with_capacity(lines.len());
        let mut subtotal = rust_decimal::Decimal::ZERO;
        let mut count = 0u32;

        for line in lines {
            let unit = line.product.effective_price();
            let total = unit * rust_decimal::Decimal::from(line.item.quantity);
            subtotal += total;
            count = count.saturating_add(line.item.quantity);
            items.push(CartItemView {
                line_id: line.item.id.to_string(),
                product_id: line.product.id.to_string(),
                name: line.product.name.clone(),
                image: line.product.primary_image().map(String::from),
                quantity: line.item.quantity,
                unit_price: currency.convert_and_format(unit),
                line_total: currency.convert_and_format(total),
                from_explore: line.item.collection_type.as_deref() == Some(EXPLORE_COLLECTION),
            });
        }

        Self {
            items,
            subtotal: currency.convert_and_format(subtotal),
            item_count: count,
        }
    }
}

/// Load the visitor's cart, whichever side it lives on.
pub(crate) async fn load_cart_view(
    state: &AppState,
    session: &Session,
    auth: Option<&Authed>,
    currency: CurrencyCode,
) -> CartView {
    match auth {
        Some(auth) => match state.api().cart(&auth.token).await {
            Ok(entries) => CartView::from_entries(&entries, currency),
            Err(e) => {
                tracing::warn!("Failed to fetch cart: {e}");
                CartView::empty(currency)
            }
        },
        None => {
            let cart = load_guest_cart(session).await;
            let lines = hydrate_guest_cart(state.api(), &cart).await;
            CartView::from_guest_lines(&lines, currency)
        }
    }
}

// =============================================================================
// Form Data
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
    pub collection_type: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub signed_in: bool,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
) -> impl IntoResponse {
    let cart = load_cart_view(&state, &session, auth.as_ref(), currency).await;

    CartShowTemplate {
        cart,
        signed_in: auth.is_some(),
    }
}

/// Add an item to the cart (HTMX).
///
/// Returns the refreshed count badge plus an `HX-Trigger` so any other
/// cart-bound fragments on the page refresh themselves.
#[instrument(skip(state, session, auth, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let Some(quantity) = NonZeroU32::new(form.quantity.unwrap_or(1)) else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<span class=\"form-error\">Quantity must be at least 1</span>"),
        )
            .into_response();
    };

    let count = match &auth {
        Some(auth) => {
            let product_id = ProductId::new(&form.product_id);
            let tag = form.collection_type.as_deref().filter(|c| !c.is_empty());
            if let Err(e) = state
                .api()
                .add_to_cart(&auth.token, &product_id, quantity.get(), tag)
                .await
            {
                tracing::error!("Failed to add item to cart: {e}");
                return (
                    StatusCode::BAD_GATEWAY,
                    Html("<span class=\"form-error\">Error adding to cart</span>"),
                )
                    .into_response();
            }
            backend_cart_count(&state, auth).await
        }
        None => {
            let mut cart = load_guest_cart(&session).await;
            cart.add(
                ProductId::new(&form.product_id),
                quantity,
                form.collection_type.filter(|c| !c.is_empty()),
            );
            let count = cart.total_quantity();
            save_guest_cart(&session, &cart).await;
            count
        }
    };

    add_breadcrumb(
        "cart",
        "Added product to cart",
        Some(&[("product_id", form.product_id.as_str())]),
    );

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate { count },
    )
        .into_response()
}

/// Update a cart line's quantity (HTMX).
///
/// A quantity of zero removes the line. The backend cart has no quantity
/// endpoint, so for signed-in visitors the row is removed and re-added.
#[instrument(skip(state, session, auth, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    match &auth {
        Some(authed) => update_backend_line(&state, authed, &form).await,
        None => {
            let mut cart = load_guest_cart(&session).await;
            if let Ok(line_id) = Uuid::parse_str(&form.line_id) {
                match NonZeroU32::new(form.quantity) {
                    Some(quantity) => {
                        cart.set_quantity(line_id, quantity);
                    }
                    None => {
                        cart.remove(line_id);
                    }
                }
                save_guest_cart(&session, &cart).await;
            }
        }
    }

    let cart = load_cart_view(&state, &session, auth.as_ref(), currency).await;
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Replace a backend cart row to change its quantity.
async fn update_backend_line(state: &AppState, auth: &Authed, form: &UpdateCartForm) {
    let line_id = CartItemId::new(&form.line_id);

    // Resolve the row to its product before dropping it
    let product_id = match state.api().cart(&auth.token).await {
        Ok(entries) => entries
            .iter()
            .find(|entry| entry.cart_item.id == line_id)
            .map(|entry| entry.product.id.clone()),
        Err(e) => {
            tracing::warn!("Failed to fetch cart for quantity update: {e}");
            return;
        }
    };
    let Some(product_id) = product_id else {
        return;
    };

    if let Err(e) = state.api().remove_cart_item(&auth.token, &line_id).await {
        tracing::warn!("Failed to remove cart row for quantity update: {e}");
        return;
    }

    if let Some(quantity) = NonZeroU32::new(form.quantity)
        && let Err(e) = state
            .api()
            .add_to_cart(&auth.token, &product_id, quantity.get(), None)
            .await
    {
        tracing::error!("Failed to re-add cart row with new quantity: {e}");
    }
}

/// Remove a cart line (HTMX).
#[instrument(skip(state, session, auth, form))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    match &auth {
        Some(authed) => {
            let line_id = CartItemId::new(&form.line_id);
            if let Err(e) = state.api().remove_cart_item(&authed.token, &line_id).await {
                tracing::warn!("Failed to remove cart row: {e}");
            }
        }
        None => {
            let mut cart = load_guest_cart(&session).await;
            if let Ok(line_id) = Uuid::parse_str(&form.line_id) {
                cart.remove(line_id);
                save_guest_cart(&session, &cart).await;
            }
        }
    }

    let cart = load_cart_view(&state, &session, auth.as_ref(), currency).await;
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Get the cart count badge (HTMX).
#[instrument(skip(state, session, auth))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> impl IntoResponse {
    let count = match &auth {
        Some(auth) => backend_cart_count(&state, auth).await,
        None => load_guest_cart(&session).await.total_quantity(),
    };

    CartCountTemplate { count }
}

/// Total units in the backend cart, zero when it cannot be read.
async fn backend_cart_count(state: &AppState, auth: &Authed) -> u32 {
    state.api().cart(&auth.token).await.map_or(0, |entries| {
        entries
            .iter()
            .fold(0u32, |sum, entry| sum.saturating_add(entry.cart_item.quantity))
    })
}
