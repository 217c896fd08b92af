//! Wire types for the backend's admin REST surface.
//!
//! Pages of scaffold-managed entities (products, categories, landmarks,
//! coupons) travel as raw `serde_json::Value` rows: the entity schemas
//! decide which keys to show and edit, and unknown keys must round-trip
//! untouched. Everything with a fixed shape (stats, orders, customers)
//! gets a typed struct. Prices are bound to `Decimal` at this boundary;
//! timestamps stay as ISO-8601 strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use merlion_core::{OrderId, ProductId, UserId};

// =============================================================================
// Auth
// =============================================================================

/// The signed-in operator, as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Response to a successful admin login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub session_token: String,
    pub user: AdminIdentity,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Dashboard counters plus the two attention lists.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_orders: i64,
    pub total_customers: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    #[serde(default)]
    pub recent_orders: Vec<AdminOrder>,
    #[serde(default)]
    pub low_stock_products: Vec<StockAlert>,
}

/// A product running low on stock (projection of the product doc).
#[derive(Debug, Clone, Deserialize)]
pub struct StockAlert {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub sku: String,
}

// =============================================================================
// Orders
// =============================================================================

/// An order as the fulfilment views see it.
///
/// The backend stores card orders as payment-session records, so fields
/// beyond id/amount vary by how the order was placed. Everything optional
/// here defaults rather than failing the whole page.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminOrder {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub subtotal: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub payment_status: String,
    /// Raw lifecycle value; freshly created sessions say "initiated",
    /// everything after that is one of `core::OrderStatus`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub cart_items: Vec<OrderLine>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub coupon: Option<CouponSnapshot>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One line of an order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
}

/// Shipping address attached to an order (stored with camelCase keys).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub email: Option<String>,
}

/// The coupon snapshot frozen onto an order at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponSnapshot {
    #[serde(default)]
    pub code: String,
}

/// One page of orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersPage {
    pub orders: Vec<AdminOrder>,
    #[serde(default)]
    pub total: i64,
}

/// Filters for the orders list endpoint.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub is_guest: Option<bool>,
    pub skip: i64,
    pub limit: i64,
}

impl OrderQuery {
    /// Render as query-string pairs, omitting unset filters.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(is_guest) = self.is_guest {
            pairs.push(("is_guest", is_guest.to_string()));
        }
        if self.skip > 0 {
            pairs.push(("skip", self.skip.to_string()));
        }
        if self.limit > 0 {
            pairs.push(("limit", self.limit.to_string()));
        }
        pairs
    }
}

// =============================================================================
// Customers
// =============================================================================

/// A customer row, annotated with their paid-order count.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminCustomer {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub order_count: i64,
}

/// One page of customers.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomersPage {
    pub customers: Vec<AdminCustomer>,
    #[serde(default)]
    pub total: i64,
}

// =============================================================================
// Scaffold entities
// =============================================================================

/// One page of scaffold-managed entity rows.
///
/// Rows stay as raw JSON objects; the entity schema picks out columns and
/// form fields by key. `total` is present only for paginated endpoints.
#[derive(Debug, Clone)]
pub struct EntityPage {
    pub items: Vec<Value>,
    pub total: Option<i64>,
}

// =============================================================================
// Mutation acknowledgements
// =============================================================================

/// Generic `{"message": ...}` mutation response.
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    pub message: String,
}

/// Response to flipping a coupon's active flag.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleResponse {
    pub message: String,
    pub active: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_query_to_pairs_skips_unset() {
        let query = OrderQuery {
            status: Some("shipped".to_string()),
            is_guest: None,
            skip: 0,
            limit: 50,
        };
        assert_eq!(
            query.to_pairs(),
            vec![("status", "shipped".to_string()), ("limit", "50".to_string())]
        );

        assert!(OrderQuery::default().to_pairs().is_empty());
    }

    #[test]
    fn test_admin_order_tolerates_sparse_docs() {
        // Direct orders lack the payment-session bookkeeping fields
        let order: AdminOrder = serde_json::from_str(
            r#"{"id": "ord-1", "amount": 42.5}"#,
        )
        .unwrap();
        assert_eq!(order.amount, Decimal::new(425, 1));
        assert!(order.user_email.is_none());
        assert!(order.cart_items.is_empty());
        assert_eq!(order.status, "");
    }

    #[test]
    fn test_address_uses_camel_case_keys() {
        let address: Address = serde_json::from_str(
            r#"{"fullName": "Tan Wei Ling", "postalCode": "049483", "city": "Singapore"}"#,
        )
        .unwrap();
        assert_eq!(address.full_name, "Tan Wei Ling");
        assert_eq!(address.postal_code, "049483");
        assert!(address.email.is_none());
    }

    #[test]
    fn test_dashboard_stats_revenue_is_decimal() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{
                "total_products": 120,
                "total_orders": 31,
                "total_customers": 18,
                "total_revenue": 2543.75,
                "recent_orders": [],
                "low_stock_products": [{"id": "p-9", "name": "Merlion keychain", "stock": 3}]
            }"#,
        )
        .unwrap();
        assert_eq!(stats.total_revenue, Decimal::new(254_375, 2));
        assert_eq!(stats.low_stock_products[0].stock, 3);
        assert_eq!(stats.low_stock_products[0].sku, "");
    }
}
