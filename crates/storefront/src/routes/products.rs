//! Product catalog route handlers: listing, detail, new arrivals, reviews.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use merlion_core::{CurrencyCode, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, Product, ProductQuery, ProductSort, Review};
use crate::filters;
use crate::middleware::{CspNonce, CurrencyPrefs, OptionalAuth, RequireAuth};
use crate::models::{Flash, set_flash};
use crate::state::AppState;

/// Products shown per listing page.
const PRODUCTS_PER_PAGE: u16 = 12;

/// Related products shown under a product detail page.
const RELATED_PRODUCTS: u16 = 4;

// =============================================================================
// Views
// =============================================================================

/// Product card display data for grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    /// List price, shown struck through when the product is on sale.
    pub original_price: Option<String>,
    pub image: Option<String>,
    pub stars: String,
    pub review_count: i64,
    pub is_bestseller: bool,
    pub out_of_stock: bool,
    /// Set for products that belong to a themed collection page, carried
    /// through the add-to-cart form.
    pub collection_type: Option<String>,
}

impl ProductCardView {
    /// Build a card with prices converted into the display currency.
    #[must_use]
    pub fn from_product(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: currency.convert_and_format(product.effective_price()),
            original_price: product
                .on_sale()
                .then(|| currency.convert_and_format(product.price)),
            image: product.primary_image().map(String::from),
            stars: stars(product.rating),
            review_count: product.review_count,
            is_bestseller: product.is_bestseller,
            out_of_stock: product.stock <= 0,
            collection_type: None,
        }
    }

    /// Same as [`from_product`](Self::from_product), tagged with the
    /// collection the shopper found it in.
    #[must_use]
    pub fn from_collection_product(
        product: &Product,
        currency: CurrencyCode,
        collection_type: &str,
    ) -> Self {
        Self {
            collection_type: Some(collection_type.to_owned()),
            ..Self::from_product(product, currency)
        }
    }
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub long_description: String,
    pub images: Vec<String>,
    pub price: String,
    pub original_price: Option<String>,
    /// Converted amount without the symbol, for structured data.
    pub price_amount: String,
    pub currency_code: &'static str,
    pub sku: String,
    pub tags: Vec<String>,
    pub stock: i64,
    pub out_of_stock: bool,
    pub stars: String,
    pub rating: f64,
    pub review_count: i64,
}

impl ProductDetailView {
    #[must_use]
    pub fn from_product(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            long_description: product.long_description.clone(),
            images: product.images.clone(),
            price: currency.convert_and_format(product.effective_price()),
            original_price: product
                .on_sale()
                .then(|| currency.convert_and_format(product.price)),
            price_amount: format!("{:.2}", currency.convert(product.effective_price())),
            currency_code: currency.code(),
            sku: product.sku.clone(),
            tags: product.tags.clone(),
            stock: product.stock,
            out_of_stock: product.stock <= 0,
            stars: stars(product.rating),
            rating: product.rating,
            review_count: product.review_count,
        }
    }

    fn not_found(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: "Product Not Found".to_owned(),
            description: "This product could not be found.".to_owned(),
            long_description: String::new(),
            images: Vec::new(),
            price: String::new(),
            original_price: None,
            price_amount: String::new(),
            currency_code: CurrencyCode::SGD.code(),
            sku: String::new(),
            tags: Vec::new(),
            stock: 0,
            out_of_stock: true,
            stars: stars(0.0),
            rating: 0.0,
            review_count: 0,
        }
    }
}

/// Review display data.
#[derive(Clone)]
pub struct ReviewView {
    pub user_name: String,
    pub stars: String,
    pub comment: String,
    pub posted_on: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            user_name: review.user_name.clone(),
            stars: stars(f64::from(review.rating)),
            comment: review.comment.clone(),
            posted_on: short_date(review.created_at.as_deref()),
        }
    }
}

/// Category filter option for the listing sidebar.
#[derive(Clone)]
pub struct CategoryOptionView {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Sort option for the listing toolbar.
#[derive(Clone)]
pub struct SortOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Echo of the free-form filter inputs.
#[derive(Clone, Default)]
pub struct CatalogFiltersView {
    pub search: String,
    pub min_price: String,
    pub max_price: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Render a 0-5 rating as filled and hollow stars, rounded to the nearest
/// whole star.
pub(crate) fn stars(rating: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!(
        "{}{}",
        "\u{2605}".repeat(filled),
        "\u{2606}".repeat(5 - filled)
    )
}

/// Trim an ISO timestamp down to its date part for display.
pub(crate) fn short_date(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(|t| t.split('T').next())
        .unwrap_or_default()
        .to_owned()
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn parse_price(value: Option<&String>) -> Option<Decimal> {
    non_empty(value).and_then(|s| s.parse().ok())
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Listing filter and pagination parameters.
///
/// Price bounds arrive as free text from the filter form, so they are kept
/// as strings here and parsed leniently; a field someone typed garbage into
/// just does not constrain the results.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
}

impl CatalogQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    fn to_product_query(&self) -> ProductQuery {
        ProductQuery {
            search: non_empty(self.search.as_ref()),
            category_id: non_empty(self.category.as_ref()).map(merlion_core::CategoryId::new),
            min_price: parse_price(self.min_price.as_ref()),
            max_price: parse_price(self.max_price.as_ref()),
            sort: self
                .sort
                .as_deref()
                .and_then(ProductSort::from_param),
            is_featured: None,
            is_bestseller: None,
            // One extra row tells us whether a next page exists
            limit: Some(u32::from(PRODUCTS_PER_PAGE) + 1),
            skip: Some((self.page() - 1) * u32::from(PRODUCTS_PER_PAGE)),
        }
    }

    /// Link to another page of the same filtered listing.
    fn page_href(&self, page: u32) -> String {
        let mut parts = vec![format!("page={page}")];
        if let Some(search) = non_empty(self.search.as_ref()) {
            parts.push(format!("search={}", urlencoding::encode(&search)));
        }
        if let Some(category) = non_empty(self.category.as_ref()) {
            parts.push(format!("category={}", urlencoding::encode(&category)));
        }
        if let Some(min) = non_empty(self.min_price.as_ref()) {
            parts.push(format!("min_price={}", urlencoding::encode(&min)));
        }
        if let Some(max) = non_empty(self.max_price.as_ref()) {
            parts.push(format!("max_price={}", urlencoding::encode(&max)));
        }
        if let Some(sort) = self.sort.as_deref().and_then(ProductSort::from_param) {
            parts.push(format!("sort={}", sort.as_str()));
        }
        format!("/products?{}", parts.join("&"))
    }
}

// =============================================================================
// Form Data
// =============================================================================

/// Review submission form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: i32,
    pub comment: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryOptionView>,
    pub sort_options: Vec<SortOptionView>,
    pub query: CatalogFiltersView,
    pub current_page: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
    pub reviews: Vec<ReviewView>,
    pub related_products: Vec<ProductCardView>,
    pub signed_in: bool,
    pub nonce: String,
}

/// New arrivals page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/new_arrivals.html")]
pub struct NewArrivalsTemplate {
    pub products: Vec<ProductCardView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the filterable product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    CurrencyPrefs(currency): CurrencyPrefs,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let mut products = state
        .api()
        .products(&query.to_product_query())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch products: {e}");
            Vec::new()
        });

    let has_next = products.len() > usize::from(PRODUCTS_PER_PAGE);
    products.truncate(usize::from(PRODUCTS_PER_PAGE));

    let categories = state.api().categories().await.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch categories: {e}");
        Vec::new()
    });

    let selected_category = non_empty(query.category.as_ref()).unwrap_or_default();
    let selected_sort = query.sort.as_deref().and_then(ProductSort::from_param);
    let page = query.page();

    ProductsIndexTemplate {
        products: products
            .iter()
            .map(|p| ProductCardView::from_product(p, currency))
            .collect(),
        categories: categories
            .iter()
            .map(|c| CategoryOptionView {
                id: c.id.to_string(),
                name: c.name.clone(),
                selected: c.id.as_str() == selected_category,
            })
            .collect(),
        sort_options: ProductSort::ALL
            .iter()
            .map(|&sort| SortOptionView {
                value: sort.as_str(),
                label: sort.label(),
                selected: selected_sort == Some(sort),
            })
            .collect(),
        query: CatalogFiltersView {
            search: non_empty(query.search.as_ref()).unwrap_or_default(),
            min_price: non_empty(query.min_price.as_ref()).unwrap_or_default(),
            max_price: non_empty(query.max_price.as_ref()).unwrap_or_default(),
        },
        current_page: page,
        prev_href: (page > 1).then(|| query.page_href(page - 1)),
        next_href: has_next.then(|| query.page_href(page + 1)),
    }
}

/// Display a product detail page with reviews and related products.
#[instrument(skip(state, auth, nonce))]
pub async fn show(
    State(state): State<AppState>,
    CurrencyPrefs(currency): CurrencyPrefs,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<String>,
) -> Response {
    let product_id = ProductId::new(&id);

    let product = match state.api().product(&product_id).await {
        Ok(product) => product,
        Err(ApiError::NotFound(_)) => {
            return (
                StatusCode::NOT_FOUND,
                ProductShowTemplate {
                    product: ProductDetailView::not_found(&id),
                    reviews: Vec::new(),
                    related_products: Vec::new(),
                    signed_in: auth.is_some(),
                    nonce,
                },
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to fetch product {id}: {e}");
            return crate::error::AppError::from(e).into_response();
        }
    };

    let reviews = state
        .api()
        .reviews(&product_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch reviews for {id}: {e}");
            Vec::new()
        });

    let related_products = related(&state, &product, currency).await;

    ProductShowTemplate {
        product: ProductDetailView::from_product(&product, currency),
        reviews: reviews.iter().map(ReviewView::from).collect(),
        related_products,
        signed_in: auth.is_some(),
        nonce,
    }
    .into_response()
}

/// Products from the same category, excluding the one on display.
async fn related(
    state: &AppState,
    product: &Product,
    currency: CurrencyCode,
) -> Vec<ProductCardView> {
    let Some(category_id) = product.category_id.clone() else {
        return Vec::new();
    };

    let query = ProductQuery {
        category_id: Some(category_id),
        limit: Some(u32::from(RELATED_PRODUCTS) + 1),
        ..ProductQuery::default()
    };

    match state.api().products(&query).await {
        Ok(products) => products
            .iter()
            .filter(|p| p.id != product.id)
            .take(usize::from(RELATED_PRODUCTS))
            .map(|p| ProductCardView::from_product(p, currency))
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch related products: {e}");
            Vec::new()
        }
    }
}

/// Display the new arrivals page.
#[instrument(skip(state))]
pub async fn new_arrivals(
    State(state): State<AppState>,
    CurrencyPrefs(currency): CurrencyPrefs,
) -> impl IntoResponse {
    let products = state
        .api()
        .new_arrivals(u32::from(PRODUCTS_PER_PAGE))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch new arrivals: {e}");
            Vec::new()
        });

    NewArrivalsTemplate {
        products: products
            .iter()
            .map(|p| ProductCardView::from_product(p, currency))
            .collect(),
    }
}

/// Submit a review, then return to the product page.
#[instrument(skip(state, session, auth, form))]
pub async fn submit_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    axum::Form(form): axum::Form<ReviewForm>,
) -> Response {
    let product_id = ProductId::new(&id);
    let rating = form.rating.clamp(1, 5);

    match state
        .api()
        .submit_review(&auth.token, &product_id, rating, form.comment.trim())
        .await
    {
        Ok(_) => {
            set_flash(&session, Flash::success("Thanks for your review!")).await;
        }
        Err(e) => {
            tracing::warn!("Failed to submit review for {id}: {e}");
            set_flash(
                &session,
                Flash::error("We could not save your review. Please try again."),
            )
            .await;
        }
    }

    Redirect::to(&format!("/products/{id}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars_rounds_to_nearest() {
        assert_eq!(stars(4.6), "\u{2605}\u{2605}\u{2605}\u{2605}\u{2605}");
        assert_eq!(stars(4.2), "\u{2605}\u{2605}\u{2605}\u{2605}\u{2606}");
        assert_eq!(stars(0.0), "\u{2606}\u{2606}\u{2606}\u{2606}\u{2606}");
    }

    #[test]
    fn test_stars_clamps_out_of_range() {
        assert_eq!(stars(9.0), "\u{2605}\u{2605}\u{2605}\u{2605}\u{2605}");
        assert_eq!(stars(-1.0), "\u{2606}\u{2606}\u{2606}\u{2606}\u{2606}");
    }

    #[test]
    fn test_short_date_takes_date_part() {
        assert_eq!(
            short_date(Some("2024-06-01T10:30:00.123456")),
            "2024-06-01"
        );
        assert_eq!(short_date(None), "");
    }

    #[test]
    fn test_page_href_carries_filters() {
        let query = CatalogQuery {
            search: Some("merlion plush".to_owned()),
            category: Some("cat-1".to_owned()),
            sort: Some("price_asc".to_owned()),
            ..CatalogQuery::default()
        };
        assert_eq!(
            query.page_href(3),
            "/products?page=3&search=merlion%20plush&category=cat-1&sort=price_asc"
        );
    }

    #[test]
    fn test_page_href_drops_empty_and_invalid_filters() {
        let query = CatalogQuery {
            search: Some("  ".to_owned()),
            min_price: Some("abc".to_owned()),
            sort: Some("bogus".to_owned()),
            ..CatalogQuery::default()
        };
        // min_price is kept as typed (it is an echo), sort and search are not
        assert_eq!(query.page_href(1), "/products?page=1&min_price=abc");
    }

    #[test]
    fn test_lenient_price_parsing() {
        assert_eq!(parse_price(Some(&"12.5".to_owned())), "12.5".parse().ok());
        assert_eq!(parse_price(Some(&String::new())), None);
        assert_eq!(parse_price(Some(&"abc".to_owned())), None);
        assert_eq!(parse_price(None), None);
    }
}
