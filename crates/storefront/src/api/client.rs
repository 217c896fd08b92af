//! Backend REST client implementation.
//!
//! Thin typed wrapper over `reqwest` with `moka` caching (5-minute TTL) for
//! catalog reads. Account-scoped calls take the visitor's backend session
//! token and send it as a bearer credential.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use merlion_core::{CartItemId, CategoryId, Coupon, LandmarkId, ProductId};

use crate::api::ApiError;
use crate::api::types::{
    Acknowledgement, AuthResponse, CartEntry, Category, ChatReply, CheckoutSession,
    CheckoutSessionCreate, CheckoutStatus, Deal, Landmark, Order, OrderCreate, OtpResponse,
    Product, ProductQuery, Review, UserProfile, WishlistEntry,
};
use crate::config::BackendConfig;

/// Cached catalog values.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Category(Box<Category>),
    Categories(Vec<Category>),
    Deals(Vec<Deal>),
    Landmarks(Vec<Landmark>),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the commerce backend REST API.
///
/// Catalog reads (products, categories, deals, landmarks) are cached for
/// 5 minutes; search results and anything account-scoped bypass the cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    api_base: String,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new backend API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                api_base: format!("{}/api", config.api_url),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base)
    }

    /// Check status, then parse the body as JSON.
    ///
    /// Reads the body as text first so parse failures can log what the
    /// backend actually sent.
    async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let detail = extract_detail(&text, status);
            return Err(match status {
                reqwest::StatusCode::NOT_FOUND => ApiError::NotFound(detail),
                reqwest::StatusCode::UNAUTHORIZED => ApiError::Unauthorized(detail),
                _ => ApiError::Status { status, detail },
            });
        }

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %text.chars().take(500).collect::<String>(),
                    "Failed to parse backend response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.inner.http.get(self.url(path)).send().await?;
        Self::handle(response).await
    }

    async fn get_json_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.inner.http.post(self.url(path)).json(body).send().await?;
        Self::handle(response).await
    }

    async fn post_json_authed<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::handle(response).await
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List products with filters and sorting.
    ///
    /// Search queries bypass the cache; every other combination of filters
    /// is cached under its query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let pairs = query.to_pairs();
        let cache_key = format!(
            "products:{}",
            pairs
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&")
        );

        // Check cache (only for browse queries without search)
        if query.search.is_none()
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let response = self
            .inner
            .http
            .get(self.url("/products"))
            .query(&pairs)
            .send()
            .await?;
        let products: Vec<Product> = Self::handle(response).await?;

        if query.search.is_none() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get_json(&format!("/products/{id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Products added in the last 30 days, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn new_arrivals(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("new-arrivals:{limit}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for new arrivals");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .get_json(&format!("/products/new-arrivals?limit={limit}"))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get_json("/categories").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Get a single category by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the category does not exist.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn category(&self, id: &CategoryId) -> Result<Category, ApiError> {
        let cache_key = format!("category:{id}");

        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let category: Category = self.get_json(&format!("/categories/{id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    /// Deals that are active and inside their date window.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn deals(&self) -> Result<Vec<Deal>, ApiError> {
        let cache_key = "deals".to_string();

        if let Some(CacheValue::Deals(deals)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for deals");
            return Ok(deals);
        }

        let deals: Vec<Deal> = self.get_json("/deals").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Deals(deals.clone()))
            .await;

        Ok(deals)
    }

    /// List all Explore Singapore landmarks.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn landmarks(&self) -> Result<Vec<Landmark>, ApiError> {
        let cache_key = "landmarks".to_string();

        if let Some(CacheValue::Landmarks(landmarks)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for landmarks");
            return Ok(landmarks);
        }

        let landmarks: Vec<Landmark> = self.get_json("/landmarks").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Landmarks(landmarks.clone()))
            .await;

        Ok(landmarks)
    }

    /// Find a landmark by its slug.
    ///
    /// The backend only exposes the full list, so this filters it here.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no landmark has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn landmark_by_slug(&self, slug: &str) -> Result<Landmark, ApiError> {
        let landmarks = self.landmarks().await?;
        landmarks
            .into_iter()
            .find(|l| l.slug == slug)
            .ok_or_else(|| ApiError::NotFound(format!("Landmark not found: {slug}")))
    }

    /// Souvenirs from the Explore Singapore collection, optionally scoped
    /// to one landmark.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn explore_products(
        &self,
        landmark_id: Option<&LandmarkId>,
    ) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!(
            "explore:{}",
            landmark_id.map_or("all", merlion_core::LandmarkId::as_str)
        );

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for explore products");
            return Ok(products);
        }

        let path = match landmark_id {
            Some(id) => format!("/explore-singapore-products?landmark_id={id}"),
            None => "/explore-singapore-products".to_string(),
        };
        let products: Vec<Product> = self.get_json(&path).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Start registration; the backend issues an OTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<OtpResponse, ApiError> {
        self.post_json(
            "/auth/register",
            &serde_json::json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    /// Complete registration with the emailed OTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the OTP is wrong or expired.
    #[instrument(skip(self, otp), fields(email = %email))]
    pub async fn verify_registration(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.post_json(
            "/auth/verify-otp",
            &serde_json::json!({ "email": email, "otp": otp }),
        )
        .await
    }

    /// Start login; the backend checks the password and issues an OTP.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` on bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<OtpResponse, ApiError> {
        self.post_json(
            "/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Complete login with the emailed OTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the OTP is wrong or expired.
    #[instrument(skip(self, otp), fields(email = %email))]
    pub async fn verify_login(&self, email: &str, otp: &str) -> Result<AuthResponse, ApiError> {
        self.post_json(
            "/auth/verify-login-otp",
            &serde_json::json!({ "email": email, "otp": otp }),
        )
        .await
    }

    /// Fetch the profile behind a session token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is no longer valid.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.get_json_authed("/auth/me", token).await
    }

    /// Invalidate a session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<Acknowledgement, ApiError> {
        self.post_json_authed("/auth/logout", token, &serde_json::json!({}))
            .await
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// The visitor's backend cart, each row joined with its product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is invalid.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &str) -> Result<Vec<CartEntry>, ApiError> {
        self.get_json_authed("/cart", token).await
    }

    /// Add a product to the backend cart.
    ///
    /// The backend merges quantities when the product is already present.
    /// `collection_type` tags adds from curated pages; the stored cart row
    /// keeps only the product and quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is invalid.
    #[instrument(skip(self, token), fields(product_id = %product_id, quantity))]
    pub async fn add_to_cart(
        &self,
        token: &str,
        product_id: &ProductId,
        quantity: u32,
        collection_type: Option<&str>,
    ) -> Result<Acknowledgement, ApiError> {
        self.post_json_authed(
            "/cart",
            token,
            &serde_json::json!({
                "product_id": product_id,
                "quantity": quantity,
                "collection_type": collection_type,
            }),
        )
        .await
    }

    /// Remove a row from the backend cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the row does not exist (or belongs
    /// to someone else).
    #[instrument(skip(self, token), fields(cart_item_id = %id))]
    pub async fn remove_cart_item(
        &self,
        token: &str,
        id: &CartItemId,
    ) -> Result<Acknowledgement, ApiError> {
        let response = self
            .inner
            .http
            .delete(self.url(&format!("/cart/{id}")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// The visitor's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is invalid.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        self.get_json_authed("/orders", token).await
    }

    /// Place an order directly (PayNow, cash on delivery).
    ///
    /// The backend clears the visitor's cart as part of this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is invalid.
    #[instrument(skip(self, token, order))]
    pub async fn place_order(&self, token: &str, order: &OrderCreate) -> Result<Order, ApiError> {
        self.post_json_authed("/orders", token, order).await
    }

    // =========================================================================
    // Checkout Methods
    // =========================================================================

    /// Open a hosted payment session. Guests are allowed; the email in the
    /// shipping address identifies them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn create_checkout_session(
        &self,
        token: Option<&str>,
        body: &CheckoutSessionCreate,
    ) -> Result<CheckoutSession, ApiError> {
        match token {
            Some(token) => {
                self.post_json_authed("/checkout/create-session", token, body)
                    .await
            }
            None => self.post_json("/checkout/create-session", body).await,
        }
    }

    /// Look up a payment session. On the first call after payment settles,
    /// the backend creates the order and clears the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for anonymous callers; the backend
    /// only reports status to signed-in visitors.
    #[instrument(skip(self, token), fields(session_id = %session_id))]
    pub async fn checkout_status(
        &self,
        token: Option<&str>,
        session_id: &str,
    ) -> Result<CheckoutStatus, ApiError> {
        let path = format!("/checkout/status/{session_id}");
        match token {
            Some(token) => self.get_json_authed(&path, token).await,
            None => self.get_json(&path).await,
        }
    }

    // =========================================================================
    // Review Methods
    // =========================================================================

    /// Reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, ApiError> {
        self.get_json(&format!("/reviews/{product_id}")).await
    }

    /// Submit a review; the backend recomputes the product's average rating.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is invalid.
    #[instrument(skip(self, token, comment), fields(product_id = %product_id, rating))]
    pub async fn submit_review(
        &self,
        token: &str,
        product_id: &ProductId,
        rating: i32,
        comment: &str,
    ) -> Result<Review, ApiError> {
        let review: Review = self
            .post_json_authed(
                "/reviews",
                token,
                &serde_json::json!({
                    "product_id": product_id,
                    "rating": rating,
                    "comment": comment,
                }),
            )
            .await?;

        // The product's rating and review count just changed
        self.inner
            .cache
            .invalidate(&format!("product:{product_id}"))
            .await;

        Ok(review)
    }

    // =========================================================================
    // Coupon Methods
    // =========================================================================

    /// Validate a coupon code.
    ///
    /// The backend uppercases the code before lookup.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown codes and `ApiError::Status`
    /// with the backend's message for expired or deactivated ones.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn validate_coupon(&self, code: &str) -> Result<Coupon, ApiError> {
        self.post_json("/coupons/validate", &serde_json::json!({ "code": code }))
            .await
    }

    // =========================================================================
    // Wishlist Methods
    // =========================================================================

    /// The visitor's wishlist, each row joined with its product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is invalid.
    #[instrument(skip(self, token))]
    pub async fn wishlist(&self, token: &str) -> Result<Vec<WishlistEntry>, ApiError> {
        self.get_json_authed("/wishlist", token).await
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 400 if it is already there.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<Acknowledgement, ApiError> {
        self.post_json_authed(
            &format!("/wishlist/{product_id}"),
            token,
            &serde_json::json!({}),
        )
        .await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if it was not on the wishlist.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<Acknowledgement, ApiError> {
        let response = self
            .inner
            .http
            .delete(self.url(&format!("/wishlist/{product_id}")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    // =========================================================================
    // Chat Methods
    // =========================================================================

    /// Send a message to the shopping assistant.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, message), fields(session_id = %session_id))]
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<ChatReply, ApiError> {
        self.post_json(
            "/chat",
            &serde_json::json!({ "session_id": session_id, "message": message }),
        )
        .await
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Cheap reachability probe for the readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not reachable or unhealthy.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let _: Vec<Category> = self.get_json("/categories").await?;
        Ok(())
    }
}

/// Pull the backend's `{"detail": ...}` message out of an error body.
///
/// Validation errors arrive as a list of objects; those are compacted to
/// their JSON form rather than dropped.
fn extract_detail(body: &str, status: reqwest::StatusCode) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|e| match e.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_string() {
        let detail = extract_detail(
            r#"{"detail": "Invalid coupon code"}"#,
            reqwest::StatusCode::NOT_FOUND,
        );
        assert_eq!(detail, "Invalid coupon code");
    }

    #[test]
    fn test_extract_detail_validation_list() {
        let detail = extract_detail(
            r#"{"detail": [{"loc": ["body", "email"], "msg": "field required"}]}"#,
            reqwest::StatusCode::UNPROCESSABLE_ENTITY,
        );
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_extract_detail_falls_back_to_reason() {
        let detail = extract_detail("<html>teapot</html>", reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(detail, "Bad Gateway");
    }

    #[test]
    fn test_client_builds_urls_from_config() {
        let client = ApiClient::new(&BackendConfig {
            api_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
        })
        .unwrap();
        assert_eq!(
            client.url("/products/p1"),
            "http://localhost:8000/api/products/p1"
        );
    }
}
