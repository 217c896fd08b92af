//! Idempotent sample-catalog seeding through the admin API.
//!
//! Creates the demo categories, products, landmarks and coupons a fresh
//! environment needs. Existing rows are left alone: categories match by
//! name, products by SKU, landmarks by slug and coupons by code, so the
//! command is safe to re-run.
//!
//! # Usage
//!
//! ```bash
//! mg-cli seed
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - Base URL of the commerce backend
//! - `BACKEND_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `ADMIN_EMAIL` - Operator account used to sign in
//! - `ADMIN_PASSWORD` - Operator password

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use merlion_admin::api::{AdminApiClient, ApiError};
use merlion_admin::config::BackendConfig;
use merlion_admin::scaffold;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use thiserror::Error;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Environment variable holds an unusable value.
    #[error("Invalid value for {0}: {1}")]
    InvalidEnvVar(&'static str, String),

    /// A backend call failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// A sample product names a category the backend does not have.
    #[error("Sample data references unknown category: {0}")]
    UnknownCategory(String),
}

/// Created/skipped counts for one collection.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    created: usize,
    existing: usize,
}

// =============================================================================
// Sample data
// =============================================================================

struct SampleCategory {
    name: &'static str,
    description: &'static str,
    image_url: &'static str,
    order: i64,
}

struct SampleDeal {
    percentage: u32,
    run_days: i64,
}

struct SampleProduct {
    name: &'static str,
    description: &'static str,
    /// Name of the sample category this product belongs to.
    category: &'static str,
    price: f64,
    sale_price: Option<f64>,
    stock: i64,
    sku: &'static str,
    image: &'static str,
    tags: &'static [&'static str],
    deal: Option<SampleDeal>,
}

struct SampleLandmark {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    image: &'static str,
}

struct SampleCoupon {
    code: &'static str,
    discount_type: &'static str,
    discount_value: f64,
    min_purchase: f64,
    description: &'static str,
}

const CATEGORIES: &[SampleCategory] = &[
    SampleCategory {
        name: "Airline Exclusives",
        description: "Premium products from Singapore Airlines",
        image_url: "https://images.unsplash.com/photo-1686455746257-0210c23f7064",
        order: 1,
    },
    SampleCategory {
        name: "Beauty",
        description: "Premium beauty and skincare products",
        image_url: "https://images.unsplash.com/photo-1624167479379-938f4b1c5b45",
        order: 2,
    },
    SampleCategory {
        name: "Electronics",
        description: "Latest tech and gadgets",
        image_url: "https://images.unsplash.com/photo-1686455746127-02762fade30c",
        order: 3,
    },
    SampleCategory {
        name: "Fashion",
        description: "Stylish clothing and accessories",
        image_url: "https://images.unsplash.com/photo-1749843988896-bcc365717569",
        order: 4,
    },
    SampleCategory {
        name: "Food",
        description: "Singapore's finest food and treats",
        image_url: "https://images.unsplash.com/photo-1734304185641-b6b8eb588603",
        order: 5,
    },
    SampleCategory {
        name: "Travel & Gifts",
        description: "Perfect gifts and souvenirs from Singapore",
        image_url: "https://images.unsplash.com/photo-1711657973130-8affa319e7be",
        order: 6,
    },
];

const PRODUCTS: &[SampleProduct] = &[
    SampleProduct {
        name: "Merlion Plush Toy",
        description: "Soft and huggable Merlion plush, the classic Singapore keepsake.",
        category: "Travel & Gifts",
        price: 24.90,
        sale_price: None,
        stock: 120,
        sku: "MG-TRV-001",
        image: "https://images.unsplash.com/photo-1711657973130-8affa319e7be",
        tags: &["merlion", "souvenir"],
        // The one seeded deal: a week-long 20% sale starting now
        deal: Some(SampleDeal {
            percentage: 20,
            run_days: 7,
        }),
    },
    SampleProduct {
        name: "Changi Jewel Snow Globe",
        description: "Snow globe of the Rain Vortex at Jewel Changi Airport.",
        category: "Travel & Gifts",
        price: 29.90,
        sale_price: Some(24.90),
        stock: 60,
        sku: "MG-TRV-002",
        image: "https://images.unsplash.com/photo-1711657973130-8affa319e7be",
        tags: &["souvenir", "changi"],
        deal: None,
    },
    SampleProduct {
        name: "Kaya Spread Gift Jar",
        description: "Traditional coconut kaya in a gift-ready jar.",
        category: "Food",
        price: 12.90,
        sale_price: None,
        stock: 200,
        sku: "MG-FOOD-001",
        image: "https://images.unsplash.com/photo-1734304185641-b6b8eb588603",
        tags: &["kaya", "breakfast"],
        deal: None,
    },
    SampleProduct {
        name: "Pandan Chiffon Cake Box",
        description: "Fluffy pandan chiffon cake, baked fresh and boxed for travel.",
        category: "Food",
        price: 18.50,
        sale_price: Some(15.90),
        stock: 80,
        sku: "MG-FOOD-002",
        image: "https://images.unsplash.com/photo-1734304185641-b6b8eb588603",
        tags: &["pandan", "bakery"],
        deal: None,
    },
    SampleProduct {
        name: "Peranakan Tile Scarf",
        description: "Silk scarf printed with heritage Peranakan tile motifs.",
        category: "Fashion",
        price: 39.00,
        sale_price: None,
        stock: 45,
        sku: "MG-FSH-001",
        image: "https://images.unsplash.com/photo-1749843988896-bcc365717569",
        tags: &["peranakan", "textile"],
        deal: None,
    },
    SampleProduct {
        name: "Orchid Brooch",
        description: "Gold-plated brooch shaped after the Vanda Miss Joaquim orchid.",
        category: "Fashion",
        price: 22.00,
        sale_price: None,
        stock: 70,
        sku: "MG-FSH-002",
        image: "https://images.unsplash.com/photo-1749843988896-bcc365717569",
        tags: &["orchid", "jewelry"],
        deal: None,
    },
    SampleProduct {
        name: "Orchid Hand Cream Trio",
        description: "Three orchid-scented hand creams in a travel tin.",
        category: "Beauty",
        price: 28.00,
        sale_price: Some(23.90),
        stock: 90,
        sku: "MG-BTY-001",
        image: "https://images.unsplash.com/photo-1624167479379-938f4b1c5b45",
        tags: &["orchid", "skincare"],
        deal: None,
    },
    SampleProduct {
        name: "Skyline Power Bank",
        description: "Slim power bank etched with the Singapore skyline.",
        category: "Electronics",
        price: 45.00,
        sale_price: None,
        stock: 50,
        sku: "MG-ELC-001",
        image: "https://images.unsplash.com/photo-1686455746127-02762fade30c",
        tags: &["gadget", "travel"],
        deal: None,
    },
    SampleProduct {
        name: "Batik Motif Amenity Kit",
        description: "In-flight amenity kit wrapped in a classic batik print.",
        category: "Airline Exclusives",
        price: 35.00,
        sale_price: Some(30.00),
        stock: 40,
        sku: "MG-AIR-001",
        image: "https://images.unsplash.com/photo-1686455746257-0210c23f7064",
        tags: &["batik", "inflight"],
        deal: None,
    },
];

const LANDMARKS: &[SampleLandmark] = &[
    SampleLandmark {
        name: "The Merlion",
        slug: "merlion-park",
        description: "Singapore's iconic symbol - a mythical creature with a lion's head and fish body, representing the nation's history as a fishing village.",
        image: "https://images.unsplash.com/photo-1525625293386-3f8f99389edd?w=1200&h=600&fit=crop",
    },
    SampleLandmark {
        name: "Marina Bay Sands",
        slug: "marina-bay-sands",
        description: "The iconic integrated resort featuring the world-famous rooftop SkyPark with infinity pool, luxury shopping, fine dining, and spectacular views of the city skyline.",
        image: "https://images.unsplash.com/photo-1565967511849-76a60a516170?w=1200&h=600&fit=crop",
    },
    SampleLandmark {
        name: "Gardens by the Bay",
        slug: "gardens-by-the-bay",
        description: "A futuristic nature park featuring the iconic Supertree Grove, Cloud Forest, and Flower Dome - a stunning blend of nature and technology.",
        image: "https://images.unsplash.com/photo-1562992191-913952e43bef?w=1200&h=600&fit=crop",
    },
    SampleLandmark {
        name: "Chinatown",
        slug: "chinatown",
        description: "A vibrant historic district featuring colorful shophouses, traditional temples, authentic street food, and rich Chinese cultural heritage.",
        image: "https://images.unsplash.com/photo-1555217851-6141535bd771?w=1200&h=600&fit=crop",
    },
    SampleLandmark {
        name: "Sentosa Island",
        slug: "sentosa-island",
        description: "Singapore's premier island resort destination featuring pristine beaches, Universal Studios, S.E.A. Aquarium, and endless entertainment options.",
        image: "https://images.unsplash.com/photo-1509516498892-85b0a1f69889?w=1200&h=600&fit=crop",
    },
];

const COUPONS: &[SampleCoupon] = &[
    SampleCoupon {
        code: "SAVE10",
        discount_type: "percentage",
        discount_value: 10.0,
        min_purchase: 0.0,
        description: "10% off your whole order",
    },
    SampleCoupon {
        code: "WELCOME5",
        discount_type: "fixed",
        discount_value: 5.0,
        min_purchase: 25.0,
        description: "S$5 off orders over S$25",
    },
];

// =============================================================================
// Command
// =============================================================================

/// Seed the sample catalog, skipping rows that already exist.
///
/// # Errors
///
/// Returns an error when configuration is missing, the admin login is
/// rejected, or any backend call fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let api_url = require_env("BACKEND_API_URL")?;
    let timeout_secs = std::env::var("BACKEND_TIMEOUT_SECS")
        .unwrap_or_else(|_| "10".to_owned())
        .parse::<u64>()
        .map_err(|e| SeedError::InvalidEnvVar("BACKEND_TIMEOUT_SECS", e.to_string()))?;
    let email = require_env("ADMIN_EMAIL")?;
    let password = SecretString::from(require_env("ADMIN_PASSWORD")?);

    let backend = BackendConfig {
        api_url: api_url.trim_end_matches('/').to_owned(),
        timeout_secs,
    };
    let client = AdminApiClient::new(&backend)?;

    tracing::info!("Signing in to {} as {email}", backend.api_url);
    let auth = client.admin_login(&email, password.expose_secret()).await?;
    let token = auth.session_token;

    let (categories, category_ids) = seed_categories(&client, &token).await?;
    let products = seed_products(&client, &token, &category_ids).await?;
    let landmarks = seed_landmarks(&client, &token).await?;
    let coupons = seed_coupons(&client, &token).await?;

    tracing::info!("Seed complete:");
    report("Categories", categories);
    report("Products", products);
    report("Landmarks", landmarks);
    report("Coupons", coupons);

    Ok(())
}

fn require_env(key: &'static str) -> Result<String, SeedError> {
    std::env::var(key).map_err(|_| SeedError::MissingEnvVar(key))
}

fn report(label: &str, tally: Tally) {
    tracing::info!(
        "  {label}: {} created, {} already present",
        tally.created,
        tally.existing
    );
}

// =============================================================================
// Collections
// =============================================================================

/// Seed categories and return the name-to-id map products link through.
async fn seed_categories(
    client: &AdminApiClient,
    token: &str,
) -> Result<(Tally, HashMap<String, String>), SeedError> {
    let schema = scaffold::categories_schema();

    tracing::info!("Seeding categories...");
    let page = client
        .list_entities(token, schema.list_path, schema.response_key)
        .await?;
    let existing = existing_values(&page.items, "name");

    let mut tally = Tally::default();
    for category in CATEGORIES {
        if existing.contains(category.name) {
            tracing::info!("  Category '{}' already exists", category.name);
            tally.existing += 1;
        } else {
            client
                .create_entity(token, schema.endpoint, &category_payload(category))
                .await?;
            tracing::info!("  Created category: {}", category.name);
            tally.created += 1;
        }
    }

    // The backend assigns ids, so refresh the list once anything was added
    let rows = if tally.created > 0 {
        client
            .list_entities(token, schema.list_path, schema.response_key)
            .await?
            .items
    } else {
        page.items
    };

    Ok((tally, ids_by_name(&rows)))
}

/// Seed products, resolving each sample's category to its backend id.
async fn seed_products(
    client: &AdminApiClient,
    token: &str,
    category_ids: &HashMap<String, String>,
) -> Result<Tally, SeedError> {
    let schema = scaffold::products_schema();
    let now = Utc::now();

    tracing::info!("Seeding products...");
    let mut tally = Tally::default();
    for product in PRODUCTS {
        // The product list is paged, so probe each SKU through search
        let path = format!(
            "{}?search={}",
            schema.list_path,
            urlencoding::encode(product.sku)
        );
        let page = client
            .list_entities(token, &path, schema.response_key)
            .await?;
        let exists = page
            .items
            .iter()
            .any(|row| row.get("sku").and_then(Value::as_str) == Some(product.sku));

        if exists {
            tracing::info!("  Product '{}' already exists", product.name);
            tally.existing += 1;
            continue;
        }

        let category_id = category_ids
            .get(product.category)
            .ok_or_else(|| SeedError::UnknownCategory(product.category.to_owned()))?;
        client
            .create_entity(
                token,
                schema.endpoint,
                &product_payload(product, category_id, now),
            )
            .await?;
        tracing::info!("  Created product: {}", product.name);
        tally.created += 1;
    }

    Ok(tally)
}

/// Seed the Explore Singapore landmarks.
async fn seed_landmarks(client: &AdminApiClient, token: &str) -> Result<Tally, SeedError> {
    let schema = scaffold::landmarks_schema();

    tracing::info!("Seeding landmarks...");
    let page = client
        .list_entities(token, schema.list_path, schema.response_key)
        .await?;
    let existing = existing_values(&page.items, "slug");

    let mut tally = Tally::default();
    for landmark in LANDMARKS {
        if existing.contains(landmark.slug) {
            tracing::info!("  Landmark '{}' already exists", landmark.name);
            tally.existing += 1;
        } else {
            client
                .create_entity(token, schema.endpoint, &landmark_payload(landmark))
                .await?;
            tracing::info!("  Created landmark: {}", landmark.name);
            tally.created += 1;
        }
    }

    Ok(tally)
}

/// Seed the starter coupons.
async fn seed_coupons(client: &AdminApiClient, token: &str) -> Result<Tally, SeedError> {
    let schema = scaffold::coupons_schema();

    tracing::info!("Seeding coupons...");
    let page = client
        .list_entities(token, schema.list_path, schema.response_key)
        .await?;
    let existing = existing_values(&page.items, "code");

    let mut tally = Tally::default();
    for coupon in COUPONS {
        if existing.contains(coupon.code) {
            tracing::info!("  Coupon '{}' already exists", coupon.code);
            tally.existing += 1;
        } else {
            client
                .create_entity(token, schema.endpoint, &coupon_payload(coupon))
                .await?;
            tracing::info!("  Created coupon: {}", coupon.code);
            tally.created += 1;
        }
    }

    Ok(tally)
}

// =============================================================================
// Payloads
// =============================================================================

fn category_payload(category: &SampleCategory) -> Value {
    json!({
        "name": category.name,
        "description": category.description,
        "image_url": category.image_url,
        "order": category.order,
    })
}

fn product_payload(product: &SampleProduct, category_id: &str, now: DateTime<Utc>) -> Value {
    let mut payload = json!({
        "name": product.name,
        "description": product.description,
        "category_id": category_id,
        "price": product.price,
        "sale_price": product.sale_price,
        "stock": product.stock,
        "sku": product.sku,
        "images": [product.image],
        "tags": product.tags,
    });

    if let (Some(deal), Some(map)) = (product.deal.as_ref(), payload.as_object_mut()) {
        map.insert("is_on_deal".to_owned(), json!(true));
        map.insert("deal_percentage".to_owned(), json!(deal.percentage));
        map.insert("deal_start_date".to_owned(), json!(now.to_rfc3339()));
        map.insert(
            "deal_end_date".to_owned(),
            json!((now + Duration::days(deal.run_days)).to_rfc3339()),
        );
    }

    payload
}

fn landmark_payload(landmark: &SampleLandmark) -> Value {
    json!({
        "name": landmark.name,
        "slug": landmark.slug,
        "description": landmark.description,
        "image": landmark.image,
    })
}

fn coupon_payload(coupon: &SampleCoupon) -> Value {
    json!({
        "code": coupon.code,
        "discount_type": coupon.discount_type,
        "discount_value": coupon.discount_value,
        "min_purchase": coupon.min_purchase,
        "description": coupon.description,
        "active": true,
    })
}

// =============================================================================
// Row helpers
// =============================================================================

/// Collect one string field across listed rows, for existence checks.
fn existing_values(rows: &[Value], key: &str) -> HashSet<String> {
    rows.iter()
        .filter_map(|row| row.get(key).and_then(Value::as_str))
        .map(str::to_owned)
        .collect()
}

/// Map listed rows from name to backend id.
fn ids_by_name(rows: &[Value]) -> HashMap<String, String> {
    rows.iter()
        .filter_map(|row| {
            let name = row.get("name").and_then(Value::as_str)?;
            let id = row.get("id").and_then(Value::as_str)?;
            Some((name.to_owned(), id.to_owned()))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_products_reference_known_categories() {
        let names: HashSet<&str> = CATEGORIES.iter().map(|c| c.name).collect();
        for product in PRODUCTS {
            assert!(
                names.contains(product.category),
                "{} points at missing category {}",
                product.name,
                product.category
            );
        }
    }

    #[test]
    fn test_sample_skus_are_unique() {
        let skus: HashSet<&str> = PRODUCTS.iter().map(|p| p.sku).collect();
        assert_eq!(skus.len(), PRODUCTS.len());
    }

    #[test]
    fn test_sample_landmark_slugs_are_unique() {
        let slugs: HashSet<&str> = LANDMARKS.iter().map(|l| l.slug).collect();
        assert_eq!(slugs.len(), LANDMARKS.len());
    }

    #[test]
    fn test_product_payload_includes_deal_window() {
        let product = PRODUCTS
            .iter()
            .find(|p| p.deal.is_some())
            .expect("sample data should include one deal");
        let now = Utc::now();

        let payload = product_payload(product, "cat-1", now);

        assert_eq!(
            payload.get("category_id").and_then(Value::as_str),
            Some("cat-1")
        );
        assert_eq!(payload.get("is_on_deal").unwrap(), true);
        assert_eq!(payload.get("deal_percentage").unwrap(), 20);
        assert_eq!(
            payload.get("deal_start_date").unwrap().as_str(),
            Some(now.to_rfc3339().as_str())
        );
        assert_eq!(
            payload.get("deal_end_date").unwrap().as_str(),
            Some((now + Duration::days(7)).to_rfc3339().as_str())
        );
    }

    #[test]
    fn test_product_payload_without_deal_has_no_deal_fields() {
        let product = PRODUCTS
            .iter()
            .find(|p| p.deal.is_none())
            .expect("sample data should include non-deal products");

        let payload = product_payload(product, "cat-2", Utc::now());

        assert!(payload.get("is_on_deal").is_none());
        assert!(payload.get("deal_start_date").is_none());
        assert_eq!(payload.get("sku").and_then(Value::as_str), Some(product.sku));
    }

    #[test]
    fn test_coupon_payload_is_active() {
        let coupon = COUPONS.first().expect("sample data should include coupons");
        let payload = coupon_payload(coupon);
        assert_eq!(payload.get("code").and_then(Value::as_str), Some("SAVE10"));
        assert_eq!(
            payload.get("discount_type").and_then(Value::as_str),
            Some("percentage")
        );
        assert_eq!(payload.get("active").unwrap(), true);
    }

    #[test]
    fn test_ids_by_name_skips_incomplete_rows() {
        let rows = vec![
            serde_json::json!({"id": "c-1", "name": "Food"}),
            serde_json::json!({"name": "No id"}),
            serde_json::json!({"id": "c-2"}),
        ];

        let ids = ids_by_name(&rows);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get("Food").map(String::as_str), Some("c-1"));
    }

    #[test]
    fn test_existing_values_collects_field() {
        let rows = vec![
            serde_json::json!({"sku": "MG-1"}),
            serde_json::json!({"sku": "MG-2"}),
            serde_json::json!({"name": "no sku"}),
        ];

        let values = existing_values(&rows, "sku");
        assert!(values.contains("MG-1"));
        assert!(values.contains("MG-2"));
        assert_eq!(values.len(), 2);
    }
}
