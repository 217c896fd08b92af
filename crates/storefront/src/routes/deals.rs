//! Deals page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use futures::future::join_all;
use merlion_core::CurrencyCode;
use tracing::instrument;

use crate::api::Deal;
use crate::filters;
use crate::middleware::CurrencyPrefs;
use crate::state::AppState;

pub use super::products::ProductCardView;

// =============================================================================
// Views
// =============================================================================

/// Deal banner data for the home page strip.
#[derive(Clone)]
pub struct DealCardView {
    pub title: String,
    pub description: String,
    pub discount_label: String,
    pub banner_image: Option<String>,
    pub ends_on: Option<String>,
}

impl From<&Deal> for DealCardView {
    fn from(deal: &Deal) -> Self {
        Self {
            title: deal.title.clone(),
            description: deal.description.clone(),
            discount_label: format!("{}% off", deal.discount_percentage.normalize()),
            banner_image: deal.banner_image.clone(),
            ends_on: deal
                .end_date
                .as_deref()
                .map(|d| super::products::short_date(Some(d))),
        }
    }
}

/// A deal together with the products it covers.
#[derive(Clone)]
pub struct DealView {
    pub card: DealCardView,
    pub products: Vec<ProductCardView>,
}

// =============================================================================
// Templates
// =============================================================================

/// Deals page template.
#[derive(Template, WebTemplate)]
#[template(path = "deals/index.html")]
pub struct DealsIndexTemplate {
    pub deals: Vec<DealView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display active deals with the products they cover.
///
/// Product lookups for every active deal run concurrently.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    CurrencyPrefs(currency): CurrencyPrefs,
) -> impl IntoResponse {
    let deals = state.api().deals().await.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch deals: {e}");
        Vec::new()
    });

    let active: Vec<&Deal> = deals.iter().filter(|d| d.is_active).collect();
    let product_lists = join_all(
        active.iter().map(|&deal| deal_products(&state, deal, currency)),
    )
    .await;

    DealsIndexTemplate {
        deals: active
            .into_iter()
            .zip(product_lists)
            .map(|(deal, products)| DealView {
                card: DealCardView::from(deal),
                products,
            })
            .collect(),
    }
}

/// Fetch the products a deal covers, dropping ids that no longer resolve.
async fn deal_products(
    state: &AppState,
    deal: &Deal,
    currency: CurrencyCode,
) -> Vec<ProductCardView> {
    let fetches = deal.product_ids.iter().map(|id| state.api().product(id));

    join_all(fetches)
        .await
        .into_iter()
        .zip(&deal.product_ids)
        .filter_map(|(result, id)| match result {
            Ok(product) => Some(ProductCardView::from_product(&product, currency)),
            Err(e) => {
                tracing::debug!("Skipping deal product {id}: {e}");
                None
            }
        })
        .collect()
}
