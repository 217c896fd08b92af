//! Customer route handlers.
//!
//! Customers are read-only here: the listing searches by name or email,
//! and the per-customer page shows their order history. Account changes
//! belong to the customer through the storefront.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use merlion_core::UserId;

use crate::api::AdminCustomer;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, Flash, take_flash};
use crate::routes::orders::{OrderRowView, short_date};
use crate::state::AppState;

/// Search query for the customer listing.
#[derive(Debug, Deserialize)]
pub struct CustomersQuery {
    pub search: Option<String>,
}

/// One row of the customers table.
#[derive(Clone)]
pub struct CustomerRowView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub joined_on: String,
    pub order_count: i64,
}

impl CustomerRowView {
    fn from_customer(customer: &AdminCustomer) -> Self {
        Self {
            id: customer.id.to_string(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer
                .phone
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "-".to_owned()),
            joined_on: short_date(customer.created_at.as_deref()),
            order_count: customer.order_count,
        }
    }
}

/// Customers listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersTemplate {
    pub admin: CurrentAdmin,
    pub active: &'static str,
    pub flash: Option<Flash>,
    pub customers: Vec<CustomerRowView>,
    pub total: i64,
    /// Applied search term, kept in the search box.
    pub search: String,
}

/// One customer's order history template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/orders.html")]
pub struct CustomerOrdersTemplate {
    pub admin: CurrentAdmin,
    pub active: &'static str,
    pub flash: Option<Flash>,
    pub customer_id: String,
    pub orders: Vec<OrderRowView>,
}

/// GET /customers - customer listing with search.
#[instrument(skip(state, auth, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Query(query): Query<CustomersQuery>,
) -> Result<Response> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let page = state.api().customers(&auth.token, search).await?;

    Ok(CustomersTemplate {
        admin: auth.admin,
        active: "customers",
        flash: take_flash(&session).await,
        customers: page
            .customers
            .iter()
            .map(CustomerRowView::from_customer)
            .collect(),
        total: page.total,
        search: search.unwrap_or_default().to_owned(),
    }
    .into_response())
}

/// GET /customers/{id}/orders - one customer's order history, newest first.
#[instrument(skip(state, auth, session))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let customer_id = UserId::new(id);
    let mut orders = state.api().customer_orders(&auth.token, &customer_id).await?;
    // ISO-8601 timestamps sort lexicographically; undated orders go last.
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(CustomerOrdersTemplate {
        admin: auth.admin,
        active: "customers",
        flash: take_flash(&session).await,
        customer_id: customer_id.to_string(),
        orders: orders.iter().map(OrderRowView::from_order).collect(),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_row_dashes_missing_phone() {
        let customer: AdminCustomer = serde_json::from_value(serde_json::json!({
            "id": "user-7",
            "email": "wei.ling@example.sg",
            "name": "Tan Wei Ling",
            "created_at": "2026-01-15T02:00:00Z",
            "order_count": 4
        }))
        .unwrap();

        let row = CustomerRowView::from_customer(&customer);
        assert_eq!(row.phone, "-");
        assert_eq!(row.joined_on, "2026-01-15");
        assert_eq!(row.order_count, 4);
    }

    #[test]
    fn test_customer_row_keeps_present_phone() {
        let customer: AdminCustomer = serde_json::from_value(serde_json::json!({
            "id": "user-8",
            "email": "raj@example.sg",
            "name": "Raj Kumar",
            "phone": "+65 9123 4567"
        }))
        .unwrap();

        assert_eq!(
            CustomerRowView::from_customer(&customer).phone,
            "+65 9123 4567"
        );
    }
}
