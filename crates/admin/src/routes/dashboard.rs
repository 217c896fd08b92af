//! Dashboard route handler.
//!
//! The backend computes everything in one stats call: the four headline
//! counters, the ten most recent paid orders and the products running low
//! on stock.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{DashboardStats, StockAlert};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, Flash, take_flash};
use crate::routes::orders::{OrderRowView, format_sgd};
use crate::state::AppState;

/// The four headline counters, pre-formatted.
#[derive(Clone)]
pub struct CountersView {
    pub products: String,
    pub orders: String,
    pub customers: String,
    pub revenue: String,
}

fn counters(stats: &DashboardStats) -> CountersView {
    CountersView {
        products: stats.total_products.to_string(),
        orders: stats.total_orders.to_string(),
        customers: stats.total_customers.to_string(),
        revenue: format_sgd(stats.total_revenue),
    }
}

/// One row of the low-stock panel.
#[derive(Clone)]
pub struct StockRowView {
    pub id: String,
    pub name: String,
    pub stock: i64,
    pub sku: String,
}

impl StockRowView {
    fn from_alert(alert: &StockAlert) -> Self {
        Self {
            id: alert.id.to_string(),
            name: alert.name.clone(),
            stock: alert.stock,
            sku: if alert.sku.is_empty() {
                "-".to_owned()
            } else {
                alert.sku.clone()
            },
        }
    }
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin: CurrentAdmin,
    pub active: &'static str,
    pub flash: Option<Flash>,
    pub counters: CountersView,
    pub recent_orders: Vec<OrderRowView>,
    pub low_stock: Vec<StockRowView>,
}

/// GET / - dashboard overview.
#[instrument(skip(state, auth, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
) -> Result<Response> {
    let stats = state.api().dashboard_stats(&auth.token).await?;

    Ok(DashboardTemplate {
        admin: auth.admin,
        active: "dashboard",
        flash: take_flash(&session).await,
        counters: counters(&stats),
        recent_orders: stats
            .recent_orders
            .iter()
            .map(OrderRowView::from_order)
            .collect(),
        low_stock: stats
            .low_stock_products
            .iter()
            .map(StockRowView::from_alert)
            .collect(),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_format_revenue_as_sgd() {
        let stats: DashboardStats = serde_json::from_value(serde_json::json!({
            "total_products": 120,
            "total_orders": 31,
            "total_customers": 18,
            "total_revenue": 2543.75
        }))
        .unwrap();

        let view = counters(&stats);
        assert_eq!(view.products, "120");
        assert_eq!(view.orders, "31");
        assert_eq!(view.revenue, "S$2543.75");
    }

    #[test]
    fn test_stock_rows_dash_missing_skus() {
        let alert: StockAlert = serde_json::from_value(serde_json::json!({
            "id": "p-9",
            "name": "Merlion keychain",
            "stock": 3
        }))
        .unwrap();

        let row = StockRowView::from_alert(&alert);
        assert_eq!(row.stock, 3);
        assert_eq!(row.sku, "-");
    }
}
