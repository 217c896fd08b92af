//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use merlion_core::CurrencyCode;
use tracing::instrument;

use crate::api::ProductQuery;
use crate::filters;
use crate::middleware::CurrencyPrefs;
use crate::state::AppState;

pub use super::deals::DealCardView;
pub use super::explore::LandmarkCardView;
pub use super::products::ProductCardView;

// =============================================================================
// Hero Configuration (Static content for the banner)
// =============================================================================

/// A single slide in the hero banner.
#[derive(Clone)]
pub struct HeroSlide {
    pub eyebrow: Option<String>,
    pub title: String,
    pub subtitle: Option<String>,
    pub button_text: String,
    pub button_url: String,
}

/// Hero banner configuration.
#[derive(Clone)]
pub struct HeroConfig {
    pub slides: Vec<HeroSlide>,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            slides: vec![
                HeroSlide {
                    eyebrow: Some("Straits-inspired gifts".to_string()),
                    title: "Bring a Piece of Singapore Home".to_string(),
                    subtitle: Some(
                        "Handpicked souvenirs, snacks and keepsakes from the Lion City, \
                         shipped worldwide."
                            .to_string(),
                    ),
                    button_text: "Shop All Gifts".to_string(),
                    button_url: "/products".to_string(),
                },
                HeroSlide {
                    eyebrow: None,
                    title: "Explore Singapore, Landmark by Landmark".to_string(),
                    subtitle: Some(
                        "From the Merlion to Gardens by the Bay, every piece tells a story."
                            .to_string(),
                    ),
                    button_text: "Start Exploring".to_string(),
                    button_url: "/explore".to_string(),
                },
                HeroSlide {
                    eyebrow: Some("Limited time".to_string()),
                    title: "Deals Worth a Second Look".to_string(),
                    subtitle: None,
                    button_text: "See Today's Deals".to_string(),
                    button_url: "/deals".to_string(),
                },
            ],
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Hero banner configuration.
    pub hero: HeroConfig,
    /// Featured products picked by merchandising.
    pub featured_products: Vec<ProductCardView>,
    /// Bestsellers strip.
    pub bestsellers: Vec<ProductCardView>,
    /// Latest additions to the catalog.
    pub new_arrivals: Vec<ProductCardView>,
    /// Active promotions.
    pub deals: Vec<DealCardView>,
    /// Landmark tiles linking into the explore section.
    pub landmarks: Vec<LandmarkCardView>,
}

/// Products per home page section.
const PRODUCTS_PER_SECTION: u16 = 8;

/// Landmarks shown on the home page strip.
const LANDMARKS_ON_HOME: usize = 6;

// =============================================================================
// Handlers
// =============================================================================

/// Display the home page.
///
/// The sections are independent, so their fetches run concurrently and
/// each one degrades to empty on failure rather than taking the page down.
#[instrument(skip(state))]
pub async fn home(
    State(state): State<AppState>,
    CurrencyPrefs(currency): CurrencyPrefs,
) -> impl IntoResponse {
    let (featured_products, bestsellers, new_arrivals, deals, landmarks) = tokio::join!(
        section(
            &state,
            ProductQuery {
                is_featured: Some(true),
                limit: Some(u32::from(PRODUCTS_PER_SECTION)),
                ..ProductQuery::default()
            },
            currency,
            "featured",
        ),
        section(
            &state,
            ProductQuery {
                is_bestseller: Some(true),
                limit: Some(u32::from(PRODUCTS_PER_SECTION)),
                ..ProductQuery::default()
            },
            currency,
            "bestsellers",
        ),
        arrivals_section(&state, currency),
        deals_section(&state),
        landmarks_section(&state),
    );

    HomeTemplate {
        hero: HeroConfig::default(),
        featured_products,
        bestsellers,
        new_arrivals,
        deals,
        landmarks,
    }
}

async fn arrivals_section(state: &AppState, currency: CurrencyCode) -> Vec<ProductCardView> {
    state.api().new_arrivals(4).await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch new arrivals: {e}");
            Vec::new()
        },
        |products| {
            products
                .iter()
                .map(|p| ProductCardView::from_product(p, currency))
                .collect()
        },
    )
}

async fn deals_section(state: &AppState) -> Vec<DealCardView> {
    state.api().deals().await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch deals: {e}");
            Vec::new()
        },
        |deals| {
            deals
                .iter()
                .filter(|d| d.is_active)
                .map(DealCardView::from)
                .collect()
        },
    )
}

async fn landmarks_section(state: &AppState) -> Vec<LandmarkCardView> {
    state.api().landmarks().await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch landmarks: {e}");
            Vec::new()
        },
        |landmarks| {
            landmarks
                .iter()
                .take(LANDMARKS_ON_HOME)
                .map(LandmarkCardView::from)
                .collect()
        },
    )
}

/// Fetch one home page product section, degrading to empty on failure.
async fn section(
    state: &AppState,
    query: ProductQuery,
    currency: CurrencyCode,
    name: &str,
) -> Vec<ProductCardView> {
    state.api().products(&query).await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch {name} products: {e}");
            Vec::new()
        },
        |products| {
            products
                .iter()
                .map(|p| ProductCardView::from_product(p, currency))
                .collect()
        },
    )
}
