//! Cart orchestration: hydrating guest carts and merging them into the
//! backend cart on sign-in.

use futures::future::join_all;
use tower_sessions::Session;

use merlion_core::{GuestCart, GuestCartItem, LineItem};

use crate::api::types::{CartEntry, OrderItem, Product};
use crate::api::{ApiClient, ApiError};
use crate::services::guest_cart::{load_guest_cart, save_guest_cart};

/// Collection tag on guest cart items for Explore Singapore souvenirs,
/// which live outside the main product catalog.
pub const EXPLORE_COLLECTION: &str = "explore_singapore";

/// A guest cart item joined with its product.
#[derive(Debug, Clone)]
pub struct GuestCartLine {
    pub item: GuestCartItem,
    pub product: Product,
}

/// Result of merging the guest cart into the backend cart.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOutcome {
    /// Entries pushed to the backend and removed from the session.
    pub moved: usize,
    /// Entries that failed to push and stay in the session for a later
    /// attempt.
    pub failed: usize,
}

impl MergeOutcome {
    /// Whether anything was merged at all.
    #[must_use]
    pub const fn merged_anything(&self) -> bool {
        self.moved > 0
    }
}

/// Merge the guest cart into the signed-in visitor's backend cart.
///
/// Entries are pushed one at a time; the backend folds duplicates into the
/// existing row's quantity. Only entries the backend accepted are removed
/// from the session, so a mid-merge outage loses nothing. Never fails the
/// sign-in it runs after.
pub async fn merge_guest_cart(api: &ApiClient, token: &str, session: &Session) -> MergeOutcome {
    let mut cart = load_guest_cart(session).await;
    if cart.is_empty() {
        return MergeOutcome::default();
    }

    let mut outcome = MergeOutcome::default();
    let mut moved_ids = Vec::new();

    for item in cart.items() {
        let tag = item.collection_type.as_deref();
        match api.add_to_cart(token, &item.product_id, item.quantity, tag).await {
            Ok(_) => {
                moved_ids.push(item.id);
                outcome.moved += 1;
            }
            Err(e) => {
                tracing::warn!(
                    product_id = %item.product_id,
                    error = %e,
                    "Failed to merge guest cart entry"
                );
                outcome.failed += 1;
            }
        }
    }

    cart.remove_many(&moved_ids);
    save_guest_cart(session, &cart).await;

    tracing::info!(
        moved = outcome.moved,
        failed = outcome.failed,
        "Guest cart merge finished"
    );
    outcome
}

/// Join each guest cart item with its product, concurrently.
///
/// Items whose product no longer exists are dropped from the result, the
/// same way the backend drops orphaned cart rows.
pub async fn hydrate_guest_cart(api: &ApiClient, cart: &GuestCart) -> Vec<GuestCartLine> {
    let fetches = cart
        .items()
        .iter()
        .map(|item| fetch_cart_product(api, item));

    join_all(fetches)
        .await
        .into_iter()
        .zip(cart.items().iter().cloned())
        .filter_map(|(product, item)| product.map(|product| GuestCartLine { item, product }))
        .collect()
}

/// Look up one guest cart item's product in the collection it came from.
async fn fetch_cart_product(api: &ApiClient, item: &GuestCartItem) -> Option<Product> {
    let result = if item.collection_type.as_deref() == Some(EXPLORE_COLLECTION) {
        // Explore souvenirs have no per-ID endpoint; filter the collection
        api.explore_products(None)
            .await
            .map(|products| products.into_iter().find(|p| p.id == item.product_id))
    } else {
        api.product(&item.product_id).await.map(Some)
    };

    match result {
        Ok(Some(product)) => Some(product),
        Ok(None) | Err(ApiError::NotFound(_)) => {
            tracing::debug!(product_id = %item.product_id, "Dropping cart entry for missing product");
            None
        }
        Err(e) => {
            tracing::warn!(product_id = %item.product_id, error = %e, "Failed to hydrate cart entry");
            None
        }
    }
}

// =============================================================================
// Line conversions
// =============================================================================

/// Pricing lines for a backend cart.
#[must_use]
pub fn line_items_from_entries(entries: &[CartEntry]) -> Vec<LineItem> {
    entries
        .iter()
        .map(|e| LineItem::new(e.product.effective_price(), e.cart_item.quantity))
        .collect()
}

/// Pricing lines for a hydrated guest cart.
#[must_use]
pub fn line_items_from_guest(lines: &[GuestCartLine]) -> Vec<LineItem> {
    lines
        .iter()
        .map(|l| LineItem::new(l.product.effective_price(), l.item.quantity))
        .collect()
}

/// Order lines for a backend cart, priced at today's effective price.
#[must_use]
pub fn order_items_from_entries(entries: &[CartEntry]) -> Vec<OrderItem> {
    entries
        .iter()
        .map(|e| OrderItem {
            product_id: e.product.id.clone(),
            product_name: e.product.name.clone(),
            quantity: e.cart_item.quantity,
            price: e.product.effective_price(),
        })
        .collect()
}

/// Order lines for a hydrated guest cart.
#[must_use]
pub fn order_items_from_guest(lines: &[GuestCartLine]) -> Vec<OrderItem> {
    lines
        .iter()
        .map(|l| OrderItem {
            product_id: l.product.id.clone(),
            product_name: l.product.name.clone(),
            quantity: l.item.quantity,
            price: l.product.effective_price(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use merlion_core::ProductId;
    use rust_decimal::Decimal;

    fn product(id: &str, price: &str, sale: Option<&str>) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Product {id}"),
            "slug": format!("product-{id}"),
            "price": price.parse::<f64>().unwrap(),
            "sale_price": sale.map(|s| s.parse::<f64>().unwrap()),
        }))
        .unwrap()
    }

    fn entry(id: &str, price: &str, sale: Option<&str>, quantity: u32) -> CartEntry {
        CartEntry {
            cart_item: serde_json::from_value(serde_json::json!({
                "id": format!("ci-{id}"),
                "user_id": "u1",
                "product_id": id,
                "quantity": quantity,
            }))
            .unwrap(),
            product: product(id, price, sale),
        }
    }

    #[test]
    fn test_line_items_use_effective_price() {
        let entries = vec![
            entry("p1", "10.00", None, 2),
            entry("p2", "20.00", Some("15.00"), 1),
        ];
        let lines = line_items_from_entries(&entries);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price, Decimal::new(1000, 2));
        assert_eq!(lines[1].unit_price, Decimal::new(1500, 2));
        assert_eq!(
            merlion_core::checkout::subtotal(&lines),
            Decimal::new(3500, 2)
        );
    }

    #[test]
    fn test_order_items_carry_names_and_sale_prices() {
        let entries = vec![entry("p2", "20.00", Some("15.00"), 3)];
        let items = order_items_from_entries(&entries);
        assert_eq!(items[0].product_id, ProductId::from("p2"));
        assert_eq!(items[0].product_name, "Product p2");
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].price, Decimal::new(1500, 2));
    }

    #[test]
    fn test_guest_lines_mirror_entry_conversions() {
        let mut cart = GuestCart::new();
        let quantity = std::num::NonZeroU32::new(2).unwrap();
        cart.add(ProductId::from("p1"), quantity, None);

        let lines: Vec<GuestCartLine> = cart
            .items()
            .iter()
            .map(|item| GuestCartLine {
                item: item.clone(),
                product: product("p1", "12.50", None),
            })
            .collect();

        let pricing = line_items_from_guest(&lines);
        assert_eq!(pricing[0].quantity, 2);
        assert_eq!(pricing[0].line_total(), Decimal::new(2500, 2));

        let order = order_items_from_guest(&lines);
        assert_eq!(order[0].product_name, "Product p1");
    }
}
