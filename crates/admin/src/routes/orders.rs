//! Order management route handlers.
//!
//! Card orders come out of the backend as payment-session records, so the
//! listing also holds "initiated" sessions that were never paid. Badges
//! render the raw lifecycle value; the status form only offers the five
//! steps the backend's update endpoint accepts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use merlion_core::{OrderId, OrderStatus};

use crate::api::{Address, AdminOrder, ApiError, OrderQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, Flash, set_flash, take_flash};
use crate::state::AppState;

/// Orders per listing page, matching the backend's default limit.
const PAGE_SIZE: i64 = 50;

// =============================================================================
// Query and form types
// =============================================================================

/// Filters accepted by the orders listing.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    /// "yes" limits to guest checkouts, "no" to signed-in ones.
    pub guest: Option<String>,
    pub page: Option<i64>,
}

/// Status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

// =============================================================================
// Views
// =============================================================================

/// One row of an orders table.
#[derive(Clone)]
pub struct OrderRowView {
    pub id: String,
    /// Short reference shown in listings, the tail of the backend id.
    pub reference: String,
    /// Email of the buyer, or a dash when the record has none.
    pub customer: String,
    pub guest: bool,
    pub amount: String,
    pub payment_label: String,
    pub payment_class: String,
    pub status_label: String,
    /// Raw lifecycle value used as a CSS badge class suffix.
    pub status_class: String,
    pub placed_on: String,
}

impl OrderRowView {
    pub(crate) fn from_order(order: &AdminOrder) -> Self {
        Self {
            id: order.id.to_string(),
            reference: order_reference(order.id.as_str()),
            customer: customer_label(order),
            guest: order.is_guest,
            amount: format_sgd(order.amount),
            payment_label: payment_label(&order.payment_status),
            payment_class: badge_class(&order.payment_status),
            status_label: status_label(&order.status),
            status_class: badge_class(&order.status),
            placed_on: short_date(order.created_at.as_deref()),
        }
    }
}

/// One line of the order detail.
#[derive(Clone)]
pub struct OrderLineView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Shipping address block on the detail page.
#[derive(Clone)]
pub struct AddressView {
    pub full_name: String,
    pub phone: String,
    pub line: String,
    pub email: Option<String>,
}

impl AddressView {
    fn from_address(address: &Address) -> Self {
        Self {
            full_name: address.full_name.clone(),
            phone: address.phone.clone(),
            line: format!(
                "{}, {} {}",
                address.address, address.city, address.postal_code
            ),
            email: address.email.clone(),
        }
    }
}

/// Full order detail for the show page.
pub struct OrderDetailView {
    pub id: String,
    pub reference: String,
    pub customer: String,
    pub guest: bool,
    pub amount: String,
    pub subtotal: Option<String>,
    pub discount: Option<String>,
    pub coupon_code: Option<String>,
    /// Payment currency, uppercased; SGD when the record predates it.
    pub currency: String,
    pub payment_label: String,
    pub payment_class: String,
    pub status_label: String,
    pub status_class: String,
    pub placed_on: String,
    pub lines: Vec<OrderLineView>,
    pub address: Option<AddressView>,
}

impl OrderDetailView {
    fn from_order(order: &AdminOrder) -> Self {
        let lines = order
            .cart_items
            .iter()
            .map(|line| OrderLineView {
                name: line.product_name.clone(),
                quantity: line.quantity,
                price: line.price.map_or_else(|| "-".to_owned(), format_sgd),
                line_total: line
                    .price
                    .map_or_else(|| "-".to_owned(), |p| format_sgd(p * Decimal::from(line.quantity))),
            })
            .collect();

        Self {
            id: order.id.to_string(),
            reference: order_reference(order.id.as_str()),
            customer: customer_label(order),
            guest: order.is_guest,
            amount: format_sgd(order.amount),
            subtotal: order.subtotal.map(format_sgd),
            discount: order.discount.filter(|d| !d.is_zero()).map(format_sgd),
            coupon_code: order
                .coupon
                .as_ref()
                .map(|c| c.code.clone())
                .filter(|code| !code.is_empty()),
            currency: if order.currency.is_empty() {
                "SGD".to_owned()
            } else {
                order.currency.to_uppercase()
            },
            payment_label: payment_label(&order.payment_status),
            payment_class: badge_class(&order.payment_status),
            status_label: status_label(&order.status),
            status_class: badge_class(&order.status),
            placed_on: short_date(order.created_at.as_deref()),
            lines,
            address: order.shipping_address.as_ref().map(AddressView::from_address),
        }
    }
}

/// One choice in a status dropdown.
#[derive(Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// The five lifecycle statuses with `current` preselected.
pub(crate) fn status_options(current: Option<OrderStatus>) -> Vec<StatusOption> {
    OrderStatus::ALL
        .iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            selected: current == Some(*status),
        })
        .collect()
}

// =============================================================================
// Display helpers (shared with the dashboard and customer pages)
// =============================================================================

/// Format an SGD amount for display.
pub(crate) fn format_sgd(amount: Decimal) -> String {
    format!("S${amount:.2}")
}

/// Short order reference for display, the last 6 characters uppercased.
pub(crate) fn order_reference(id: &str) -> String {
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

/// Trim an ISO timestamp down to its date part for display.
pub(crate) fn short_date(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(|t| t.split('T').next())
        .unwrap_or_default()
        .to_owned()
}

fn customer_label(order: &AdminOrder) -> String {
    order.user_email.clone().unwrap_or_else(|| "-".to_owned())
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Human label for a raw lifecycle value.
///
/// Values on the five-step lifecycle use its labels; anything else
/// ("initiated", historical data) gets its first letter raised.
pub(crate) fn status_label(raw: &str) -> String {
    raw.parse::<OrderStatus>().map_or_else(
        |_| {
            if raw.is_empty() {
                "Unknown".to_owned()
            } else {
                capitalize(raw)
            }
        },
        |status| status.label().to_owned(),
    )
}

/// Label for the payment column; dash when the record has none.
pub(crate) fn payment_label(raw: &str) -> String {
    if raw.is_empty() {
        "-".to_owned()
    } else {
        capitalize(raw)
    }
}

/// CSS badge class suffix for a raw status value.
pub(crate) fn badge_class(raw: &str) -> String {
    if raw.is_empty() {
        "none".to_owned()
    } else {
        raw.to_ascii_lowercase()
    }
}

/// Flash message for a failed mutation.
///
/// Backend rejections carry their own text ("Invalid status"); transport
/// failures and 5xx responses get a retry message.
pub(crate) fn mutation_failure(e: &ApiError) -> String {
    let unavailable = match e {
        ApiError::Http(_) | ApiError::Parse(_) => true,
        ApiError::Status { status, .. } => status.is_server_error(),
        ApiError::NotFound(_) | ApiError::Unauthorized(_) => false,
    };
    if unavailable {
        return "The backend is unavailable. Please try again.".to_owned();
    }
    e.user_detail().map_or_else(
        || "The change could not be saved.".to_owned(),
        ToOwned::to_owned,
    )
}

/// Parse the guest filter value into the backend's tri-state.
fn guest_filter(value: Option<&str>) -> Option<bool> {
    match value {
        Some("yes") => Some(true),
        Some("no") => Some(false),
        _ => None,
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Orders listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub admin: CurrentAdmin,
    pub active: &'static str,
    pub flash: Option<Flash>,
    pub orders: Vec<OrderRowView>,
    pub total: i64,
    pub page: i64,
    pub has_prev: bool,
    pub has_next: bool,
    /// Applied status filter, empty for all.
    pub status_filter: String,
    /// Applied guest filter: "", "yes" or "no".
    pub guest_filter: String,
    pub statuses: Vec<StatusOption>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderDetailTemplate {
    pub admin: CurrentAdmin,
    pub active: &'static str,
    pub flash: Option<Flash>,
    pub order: OrderDetailView,
    pub statuses: Vec<StatusOption>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /orders - paged listing with status and guest filters.
#[instrument(skip(state, auth, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Query(query): Query<OrdersQuery>,
) -> Result<Response> {
    let page = query.page.unwrap_or(1).max(1);
    // Only lifecycle values reach the backend; anything else means "all".
    let status = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<OrderStatus>().ok());

    let backend_query = OrderQuery {
        status: status.map(|s| s.as_str().to_owned()),
        is_guest: guest_filter(query.guest.as_deref()),
        skip: (page - 1) * PAGE_SIZE,
        limit: PAGE_SIZE,
    };
    let orders_page = state.api().orders(&auth.token, &backend_query).await?;

    let rows: Vec<OrderRowView> = orders_page
        .orders
        .iter()
        .map(OrderRowView::from_order)
        .collect();

    Ok(OrdersTemplate {
        admin: auth.admin,
        active: "orders",
        flash: take_flash(&session).await,
        has_prev: page > 1,
        has_next: page * PAGE_SIZE < orders_page.total,
        total: orders_page.total,
        page,
        status_filter: status.map(|s| s.as_str().to_owned()).unwrap_or_default(),
        guest_filter: query.guest.unwrap_or_default(),
        statuses: status_options(status),
        orders: rows,
    }
    .into_response())
}

/// GET /orders/{id} - order detail with the status form.
#[instrument(skip(state, auth, session))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let order_id = OrderId::new(id);
    let order = state.api().order(&auth.token, &order_id).await?;

    let current = order.status.parse::<OrderStatus>().ok();
    Ok(OrderDetailTemplate {
        admin: auth.admin,
        active: "orders",
        flash: take_flash(&session).await,
        statuses: status_options(current),
        order: OrderDetailView::from_order(&order),
    }
    .into_response())
}

/// POST /orders/{id}/status - move the order to a new lifecycle status.
#[instrument(skip(state, auth, session, form))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown order status: {}", form.status)))?;

    let order_id = OrderId::new(id);
    match state
        .api()
        .update_order_status(&auth.token, &order_id, status)
        .await
    {
        Ok(ack) => {
            tracing::info!(order_id = %order_id, status = %status, "Order status updated");
            set_flash(&session, Flash::success(ack.message)).await;
        }
        Err(ApiError::NotFound(detail)) => return Err(AppError::NotFound(detail)),
        Err(e) => {
            tracing::warn!(order_id = %order_id, "Status update failed: {}", e);
            set_flash(&session, Flash::error(mutation_failure(&e))).await;
        }
    }

    Ok(Redirect::to(&format!("/orders/{order_id}")).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn paid_order() -> AdminOrder {
        serde_json::from_value(serde_json::json!({
            "id": "68a0c2aa9d3e4b0007a1b2c3",
            "user_id": "user-1",
            "user_email": "mei.lin@example.sg",
            "is_guest": false,
            "subtotal": 54.80,
            "discount": 5.48,
            "amount": 49.32,
            "currency": "sgd",
            "payment_status": "paid",
            "status": "initiated",
            "cart_items": [
                {
                    "product_id": "prod-1",
                    "product_name": "Merlion Plush",
                    "quantity": 2,
                    "price": 24.90
                }
            ],
            "shipping_address": {
                "fullName": "Mei Lin",
                "phone": "+65 8123 4567",
                "address": "1 Raffles Place",
                "city": "Singapore",
                "postalCode": "048616"
            },
            "coupon": {"code": "MERLION10"},
            "created_at": "2026-03-02T08:30:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_row_view_formats_fields() {
        let row = OrderRowView::from_order(&paid_order());
        assert_eq!(row.reference, "A1B2C3");
        assert_eq!(row.customer, "mei.lin@example.sg");
        assert_eq!(row.amount, "S$49.32");
        assert_eq!(row.payment_label, "Paid");
        assert_eq!(row.status_label, "Initiated");
        assert_eq!(row.status_class, "initiated");
        assert_eq!(row.placed_on, "2026-03-02");
    }

    #[test]
    fn test_detail_view_lines_and_address() {
        let view = OrderDetailView::from_order(&paid_order());
        assert_eq!(view.lines[0].price, "S$24.90");
        assert_eq!(view.lines[0].line_total, "S$49.80");
        assert_eq!(view.subtotal.as_deref(), Some("S$54.80"));
        assert_eq!(view.discount.as_deref(), Some("S$5.48"));
        assert_eq!(view.coupon_code.as_deref(), Some("MERLION10"));
        assert_eq!(view.currency, "SGD");

        let address = view.address.unwrap();
        assert_eq!(address.full_name, "Mei Lin");
        assert_eq!(address.line, "1 Raffles Place, Singapore 048616");
    }

    #[test]
    fn test_status_options_preselect_current() {
        let options = status_options(Some(OrderStatus::Shipped));
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, "shipped");

        // "initiated" parses to no lifecycle step, so nothing preselects
        assert!(status_options(None).iter().all(|o| !o.selected));
    }

    #[test]
    fn test_status_label_covers_off_lifecycle_values() {
        assert_eq!(status_label("shipped"), "Shipped");
        assert_eq!(status_label("initiated"), "Initiated");
        assert_eq!(status_label(""), "Unknown");
    }

    #[test]
    fn test_guest_filter_tri_state() {
        assert_eq!(guest_filter(Some("yes")), Some(true));
        assert_eq!(guest_filter(Some("no")), Some(false));
        assert_eq!(guest_filter(Some("everything")), None);
        assert_eq!(guest_filter(None), None);
    }

    #[test]
    fn test_mutation_failure_prefers_backend_detail() {
        let rejected = ApiError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            detail: "Invalid status".to_owned(),
        };
        assert_eq!(mutation_failure(&rejected), "Invalid status");

        let outage = ApiError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            detail: "upstream".to_owned(),
        };
        assert!(mutation_failure(&outage).contains("unavailable"));
    }
}
