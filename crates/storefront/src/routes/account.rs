//! Account route handlers.
//!
//! These routes require authentication. Today the account area is the order
//! history; the profile itself is read-only and lives in the navbar.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use tracing::instrument;

use merlion_core::CurrencyCode;

use crate::api::Order;
use crate::error::Result;
use crate::filters;
use crate::middleware::{CurrencyPrefs, RequireAuth};
use crate::routes::products::short_date;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// One line of a past order.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    /// Short reference shown in the heading, the tail of the backend id.
    pub reference: String,
    pub placed_on: String,
    pub status_label: &'static str,
    /// Status slug used as a CSS badge class suffix.
    pub status_class: &'static str,
    pub payment_label: &'static str,
    pub total: String,
    pub items: Vec<OrderItemView>,
    pub address_line: String,
}

impl OrderView {
    fn from_order(order: &Order, currency: CurrencyCode) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemView {
                name: item.product_name.clone(),
                quantity: item.quantity,
                price: currency.convert_and_format(item.price * Decimal::from(item.quantity)),
            })
            .collect();

        Self {
            id: order.id.to_string(),
            reference: order_reference(order.id.as_str()),
            placed_on: short_date(order.created_at.as_deref()),
            status_label: order.status.label(),
            status_class: order.status.as_str(),
            payment_label: order.payment_method.label(),
            total: currency.convert_and_format(order.total_amount),
            items,
            address_line: format!(
                "{}, {} {}",
                order.shipping_address.address,
                order.shipping_address.city,
                order.shipping_address.postal_code
            ),
        }
    }
}

/// Short order reference for display, the last 6 characters uppercased.
fn order_reference(id: &str) -> String {
    let tail: String = id
        .chars()
        .rev()
        .take(6)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    tail.to_uppercase()
}

// =============================================================================
// Templates
// =============================================================================

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct AccountOrdersTemplate {
    pub user_name: String,
    pub orders: Vec<OrderView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /account - the account area opens on the order history.
pub async fn index() -> Redirect {
    Redirect::to("/account/orders")
}

/// GET /account/orders - list the signed-in user's orders, newest first.
#[instrument(skip(state, auth))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
) -> Result<Response> {
    let mut orders = state.api().orders(&auth.token).await?;
    // ISO-8601 timestamps sort lexicographically; undated orders go last.
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let views = orders
        .iter()
        .map(|order| OrderView::from_order(order, currency))
        .collect();

    Ok(AccountOrdersTemplate {
        user_name: auth.user.name,
        orders: views,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use merlion_core::{OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

    use crate::api::{OrderItem, ShippingAddress};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn order() -> Order {
        Order {
            id: OrderId::new("64f1c2aa9d3e4b0007a1b2c3"),
            user_id: UserId::new("user-1"),
            items: vec![OrderItem {
                product_id: ProductId::new("prod-1"),
                product_name: "Merlion Plush".to_owned(),
                quantity: 2,
                price: dec("24.90"),
            }],
            total_amount: dec("49.80"),
            status: OrderStatus::Shipped,
            shipping_address: ShippingAddress {
                full_name: "Mei Lin".to_owned(),
                phone: "+65 8123 4567".to_owned(),
                address: "1 Raffles Place".to_owned(),
                city: "Singapore".to_owned(),
                postal_code: "048616".to_owned(),
                email: None,
            },
            payment_method: PaymentMethod::Paynow,
            is_guest: false,
            created_at: Some("2025-06-11T08:30:00Z".to_owned()),
            updated_at: None,
        }
    }

    #[test]
    fn test_order_view_formats_fields() {
        let view = OrderView::from_order(&order(), CurrencyCode::SGD);
        assert_eq!(view.reference, "A1B2C3");
        assert_eq!(view.placed_on, "2025-06-11");
        assert_eq!(view.status_label, "Shipped");
        assert_eq!(view.status_class, "shipped");
        assert_eq!(view.payment_label, "PayNow");
        assert_eq!(view.total, "S$49.80");
        assert_eq!(view.items[0].price, "S$49.80");
        assert_eq!(view.address_line, "1 Raffles Place, Singapore 048616");
    }

    #[test]
    fn test_order_view_converts_totals() {
        let view = OrderView::from_order(&order(), CurrencyCode::USD);
        assert_eq!(view.total, "$36.85");
    }

    #[test]
    fn test_order_reference_short_ids() {
        assert_eq!(order_reference("abc"), "ABC");
        assert_eq!(order_reference(""), "");
    }
}
