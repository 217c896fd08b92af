//! Wire types for the commerce backend REST API.
//!
//! These structs mirror the JSON the backend produces and accepts. Prices
//! travel as JSON floats and are bound to `Decimal` at this boundary so all
//! arithmetic past it is exact. Timestamps stay as ISO-8601 strings; the
//! storefront only ever displays them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use merlion_core::{
    CartItemId, CategoryId, DealId, LandmarkId, OrderId, OrderStatus, PaymentMethod, ProductId,
    ReviewId, UserId,
};

// =============================================================================
// Catalog
// =============================================================================

/// A product as returned by the backend.
///
/// Also covers special-collection products (landmark souvenirs), which carry
/// a `landmark_id` instead of a `category_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_bestseller: bool,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: i64,
    #[serde(default)]
    pub landmark_id: Option<LandmarkId>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Product {
    /// The price a buyer actually pays, in SGD.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    /// Whether the product has an active markdown.
    #[must_use]
    pub fn on_sale(&self) -> bool {
        self.sale_price.is_some_and(|sale| sale < self.price)
    }

    /// First image URL, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<String>,
    #[serde(default)]
    pub order: i64,
}

/// A time-boxed promotion grouping several products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// A Singapore landmark from the Explore Singapore collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmark {
    pub id: LandmarkId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Filter and sort parameters for the product listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<ProductSort>,
    pub is_featured: Option<bool>,
    pub is_bestseller: Option<bool>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

impl ProductQuery {
    /// Render as query string pairs in the order the backend documents them.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category_id) = &self.category_id {
            pairs.push(("category_id", category_id.to_string()));
        }
        if let Some(min_price) = self.min_price {
            pairs.push(("min_price", min_price.to_string()));
        }
        if let Some(max_price) = self.max_price {
            pairs.push(("max_price", max_price.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort_by", sort.as_str().to_string()));
        }
        if let Some(is_featured) = self.is_featured {
            pairs.push(("is_featured", is_featured.to_string()));
        }
        if let Some(is_bestseller) = self.is_bestseller {
            pairs.push(("is_bestseller", is_bestseller.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        pairs
    }
}

/// Sort orders understood by the product listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    Newest,
    Popular,
    Rating,
}

impl ProductSort {
    /// All sort orders, for rendering the sort dropdown.
    pub const ALL: [Self; 5] = [
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Newest,
        Self::Popular,
        Self::Rating,
    ];

    /// Wire value for the `sort_by` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Newest => "newest",
            Self::Popular => "popular",
            Self::Rating => "rating",
        }
    }

    /// Human label for the sort dropdown.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::Newest => "Newest",
            Self::Popular => "Most Popular",
            Self::Rating => "Top Rated",
        }
    }

    /// Parse a `sort_by` wire value.
    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Profile of a signed-in account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Response to register/login: an OTP has been issued.
///
/// The backend echoes the code in the response body while email delivery
/// is stubbed out, so the verify page can show it as a hint.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpResponse {
    pub message: String,
    #[serde(default)]
    pub otp: Option<String>,
}

/// Response to a successful OTP or admin-login verification.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub session_token: String,
    pub user: UserProfile,
}

// =============================================================================
// Cart
// =============================================================================

/// A row in the backend cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A cart row joined with its product.
///
/// The backend silently drops rows whose product no longer exists, so the
/// cart endpoint only ever returns fully hydrated entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartEntry {
    pub cart_item: CartItem,
    pub product: Product,
}

// =============================================================================
// Orders & Checkout
// =============================================================================

/// A shipping address.
///
/// The backend stores these with camelCase keys. `email` is only present on
/// guest payment sessions, where it stands in for an account email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A single line of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body for placing an order directly (PayNow, cash on delivery).
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreate {
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// Body for opening a hosted payment session (card payments).
///
/// The backend recomputes the total from `cart_items` and the coupon; the
/// line prices here are carried through onto the order it creates on
/// completion.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSessionCreate {
    pub cart_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub currency: String,
    pub frontend_origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

/// A freshly created hosted payment session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
    pub session_id: String,
}

/// Status of a hosted payment session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutStatus {
    pub status: String,
    pub payment_status: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

impl CheckoutStatus {
    /// Whether the payment has settled.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

// =============================================================================
// Reviews, Wishlist, Chat
// =============================================================================

/// A product review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A wishlist row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: String,
    pub user_id: UserId,
    pub product_id: ProductId,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A wishlist row joined with its product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub wishlist_item: WishlistItem,
    pub product: Product,
}

/// Reply from the shopping assistant.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub message: String,
}

/// Generic `{"message": ...}` acknowledgement used by several endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_floats_to_decimal() {
        let json = r#"{
            "id": "p1",
            "name": "Merlion Keychain",
            "slug": "merlion-keychain",
            "description": "A keychain",
            "category_id": "c1",
            "price": 12.9,
            "sale_price": 9.9,
            "images": ["https://img.test/1.jpg"],
            "stock": 40,
            "is_featured": true,
            "rating": 4.5,
            "review_count": 12
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, "12.9".parse::<Decimal>().unwrap());
        assert_eq!(
            product.effective_price(),
            "9.9".parse::<Decimal>().unwrap()
        );
        assert!(product.on_sale());
        assert_eq!(product.primary_image(), Some("https://img.test/1.jpg"));
    }

    #[test]
    fn test_product_minimal_fields() {
        // Explore Singapore products have no category_id or rating
        let json = r#"{
            "id": "esp1",
            "name": "Gardens Magnet",
            "slug": "gardens-magnet",
            "price": 8.0,
            "landmark_id": "l1"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.category_id.is_none());
        assert_eq!(product.landmark_id.as_ref().unwrap().as_str(), "l1");
        assert!(!product.on_sale());
        assert_eq!(product.effective_price(), Decimal::new(80, 1));
    }

    #[test]
    fn test_shipping_address_camel_case() {
        let address = ShippingAddress {
            full_name: "Tan Wei Ming".to_string(),
            phone: "+65 9123 4567".to_string(),
            address: "1 Raffles Place".to_string(),
            city: "Singapore".to_string(),
            postal_code: "048616".to_string(),
            email: None,
        };
        let json = serde_json::to_string(&address).unwrap();
        assert!(json.contains("\"fullName\""));
        assert!(json.contains("\"postalCode\""));
        assert!(!json.contains("email"));
    }

    #[test]
    fn test_order_defaults() {
        let json = r#"{
            "id": "o1",
            "user_id": "u1",
            "items": [{"product_id": "p1", "product_name": "Keychain", "quantity": 2, "price": 9.9}],
            "total_amount": 19.8,
            "status": "pending",
            "shipping_address": {
                "fullName": "Tan Wei Ming",
                "phone": "+65 9123 4567",
                "address": "1 Raffles Place",
                "city": "Singapore",
                "postalCode": "048616"
            },
            "payment_method": "cash_on_delivery",
            "created_at": "2025-03-01T08:30:00+00:00"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert!(!order.is_guest);
        assert_eq!(order.items[0].quantity, 2);
    }

    #[test]
    fn test_product_query_pairs() {
        let query = ProductQuery {
            search: Some("merlion".to_string()),
            category_id: Some(CategoryId::from("c1")),
            sort: Some(ProductSort::PriceAsc),
            limit: Some(24),
            skip: Some(24),
            ..ProductQuery::default()
        };
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("search", "merlion".to_string())));
        assert!(pairs.contains(&("category_id", "c1".to_string())));
        assert!(pairs.contains(&("sort_by", "price_asc".to_string())));
        assert!(pairs.contains(&("limit", "24".to_string())));
        assert!(pairs.contains(&("skip", "24".to_string())));
    }

    #[test]
    fn test_product_sort_round_trip() {
        for sort in ProductSort::ALL {
            assert_eq!(ProductSort::from_param(sort.as_str()), Some(sort));
        }
        assert_eq!(ProductSort::from_param("price"), None);
    }

    #[test]
    fn test_checkout_status_paid() {
        let json = r#"{
            "status": "completed",
            "payment_status": "paid",
            "order_id": "o1",
            "amount": 42.5,
            "currency": "sgd"
        }"#;
        let status: CheckoutStatus = serde_json::from_str(json).unwrap();
        assert!(status.is_paid());
        assert_eq!(status.order_id.unwrap().as_str(), "o1");
    }

    #[test]
    fn test_checkout_session_create_skips_empty_coupon() {
        let body = CheckoutSessionCreate {
            cart_items: vec![],
            shipping_address: ShippingAddress {
                full_name: "Guest".to_string(),
                phone: String::new(),
                address: String::new(),
                city: "Singapore".to_string(),
                postal_code: "000000".to_string(),
                email: Some("guest@example.test".to_string()),
            },
            currency: "sgd".to_string(),
            frontend_origin: "https://shop.test".to_string(),
            coupon_code: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("coupon_code"));
        assert!(json.contains("\"email\":\"guest@example.test\""));
    }
}
