//! Explore Singapore route handlers.
//!
//! A themed section of the catalog: products tied to Singapore landmarks,
//! browsed landmark by landmark. Products added to the cart from here carry
//! a collection tag so the cart can label them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::api::{ApiError, Landmark};
use crate::filters;
use crate::middleware::CurrencyPrefs;
use crate::services::cart::EXPLORE_COLLECTION;
use crate::state::AppState;

pub use super::products::ProductCardView;

// =============================================================================
// Views
// =============================================================================

/// Landmark tile data.
#[derive(Clone)]
pub struct LandmarkCardView {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub image: String,
}

impl From<&Landmark> for LandmarkCardView {
    fn from(landmark: &Landmark) -> Self {
        Self {
            slug: landmark.slug.clone(),
            name: landmark.name.clone(),
            description: landmark.description.clone(),
            image: landmark.image.clone(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Explore Singapore landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "explore/index.html")]
pub struct ExploreIndexTemplate {
    pub landmarks: Vec<LandmarkCardView>,
}

/// Landmark detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "explore/show.html")]
pub struct ExploreShowTemplate {
    pub landmark: LandmarkCardView,
    pub products: Vec<ProductCardView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the landmark overview.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let landmarks = state.api().landmarks().await.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch landmarks: {e}");
        Vec::new()
    });

    ExploreIndexTemplate {
        landmarks: landmarks.iter().map(LandmarkCardView::from).collect(),
    }
}

/// Display one landmark and the products tied to it.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    CurrencyPrefs(currency): CurrencyPrefs,
    Path(slug): Path<String>,
) -> Response {
    let landmark = match state.api().landmark_by_slug(&slug).await {
        Ok(landmark) => landmark,
        Err(ApiError::NotFound(_)) => {
            return (
                StatusCode::NOT_FOUND,
                ExploreShowTemplate {
                    landmark: LandmarkCardView {
                        slug,
                        name: "Landmark Not Found".to_owned(),
                        description: "This landmark could not be found.".to_owned(),
                        image: String::new(),
                    },
                    products: Vec::new(),
                },
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to fetch landmark {slug}: {e}");
            return crate::error::AppError::from(e).into_response();
        }
    };

    let products = state
        .api()
        .explore_products(Some(&landmark.id))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch products for landmark {slug}: {e}");
            Vec::new()
        });

    ExploreShowTemplate {
        landmark: LandmarkCardView::from(&landmark),
        products: products
            .iter()
            .map(|p| {
                ProductCardView::from_collection_product(p, currency, EXPLORE_COLLECTION)
            })
            .collect(),
    }
    .into_response()
}
