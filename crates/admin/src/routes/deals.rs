//! Deals overview route handler.
//!
//! Deals live on products (`is_on_deal` plus the percentage and window
//! fields), so this page is a read-only projection of the product list.
//! Phase is derived from the window at render time; editing a deal means
//! editing its product.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, Flash, take_flash};
use crate::scaffold::{self, row_id};
use crate::state::AppState;

/// Query for the deals view.
#[derive(Debug, Deserialize)]
pub struct DealsQuery {
    pub phase: Option<String>,
}

/// Where a deal sits relative to its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DealPhase {
    Upcoming,
    Active,
    Expired,
}

impl DealPhase {
    const fn label(self) -> &'static str {
        match self {
            Self::Upcoming => "Upcoming",
            Self::Active => "Active",
            Self::Expired => "Expired",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

/// Phase of a deal window at `now`. A deal missing either boundary is
/// treated as running.
fn deal_phase(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DealPhase {
    let (Some(start), Some(end)) = (start, end) else {
        return DealPhase::Active;
    };
    if now < start {
        DealPhase::Upcoming
    } else if now > end {
        DealPhase::Expired
    } else {
        DealPhase::Active
    }
}

/// Parse a deal boundary timestamp, tolerating a missing offset.
fn parse_deal_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn date_field(row: &Value, key: &str) -> Option<DateTime<Utc>> {
    row.get(key).and_then(Value::as_str).and_then(parse_deal_date)
}

fn string_field(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn money_field(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_f64)
        .map_or_else(|| "-".to_owned(), |v| format!("S${v:.2}"))
}

/// Countdown to the end of the window, in the coarse steps the operators
/// actually care about.
fn time_left(end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(end) = end else {
        return "-".to_owned();
    };
    let remaining = end - now;
    if remaining <= chrono::Duration::zero() {
        return "Expired".to_owned();
    }

    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    if days > 0 {
        format!("{days}d {hours}h left")
    } else if remaining.num_hours() > 0 {
        format!("{}h left", remaining.num_hours())
    } else {
        "Less than 1h left".to_owned()
    }
}

/// One row of the deals table.
#[derive(Clone)]
pub struct DealRowView {
    pub name: String,
    pub sku: String,
    pub price: String,
    /// Empty when the product has no sale price.
    pub sale_price: String,
    pub percentage: String,
    pub period: String,
    pub phase_label: &'static str,
    pub phase_class: &'static str,
    pub time_left: String,
    pub edit_url: String,
}

impl DealRowView {
    fn from_product(product: &Value, now: DateTime<Utc>) -> Self {
        let start = date_field(product, "deal_start_date");
        let end = date_field(product, "deal_end_date");
        let phase = deal_phase(start, end, now);

        let period = match (start, end) {
            (Some(start), Some(end)) => {
                format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }
            _ => "No dates set".to_owned(),
        };
        let phase_label = if start.is_none() || end.is_none() {
            "Active (no dates)"
        } else {
            phase.label()
        };

        Self {
            name: string_field(product, "name"),
            sku: string_field(product, "sku"),
            price: money_field(product, "price"),
            sale_price: product
                .get("sale_price")
                .and_then(Value::as_f64)
                .map(|v| format!("S${v:.2}"))
                .unwrap_or_default(),
            percentage: product
                .get("deal_percentage")
                .and_then(Value::as_f64)
                .map_or_else(|| "-".to_owned(), |p| format!("{p:.0}% off")),
            period,
            phase_label,
            phase_class: phase.as_str(),
            time_left: time_left(end, now),
            edit_url: format!(
                "/entities/products?edit={}",
                row_id(product).unwrap_or_default()
            ),
        }
    }
}

/// Counters across every product on deal.
#[derive(Clone, Copy, Default)]
pub struct DealCounts {
    pub total: usize,
    pub active: usize,
    pub upcoming: usize,
    pub expired: usize,
}

/// Deals page template.
#[derive(Template, WebTemplate)]
#[template(path = "deals/index.html")]
pub struct DealsTemplate {
    pub admin: CurrentAdmin,
    pub active: &'static str,
    pub flash: Option<Flash>,
    pub counts: DealCounts,
    /// Applied phase filter, empty for all.
    pub phase_filter: String,
    pub rows: Vec<DealRowView>,
}

fn product_phase(product: &Value, now: DateTime<Utc>) -> DealPhase {
    deal_phase(
        date_field(product, "deal_start_date"),
        date_field(product, "deal_end_date"),
        now,
    )
}

/// GET /deals - read-only view of products on deal.
#[instrument(skip(state, auth, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Query(query): Query<DealsQuery>,
) -> Result<Response> {
    let products = scaffold::products_schema();
    let page = state
        .api()
        .list_entities(&auth.token, products.list_path, products.response_key)
        .await?;

    let now = Utc::now();
    let deals: Vec<&Value> = page
        .items
        .iter()
        .filter(|item| item.get("is_on_deal").and_then(Value::as_bool) == Some(true))
        .collect();

    let mut counts = DealCounts {
        total: deals.len(),
        ..DealCounts::default()
    };
    for product in &deals {
        match product_phase(product, now) {
            DealPhase::Active => counts.active += 1,
            DealPhase::Upcoming => counts.upcoming += 1,
            DealPhase::Expired => counts.expired += 1,
        }
    }

    let phase_filter = query
        .phase
        .filter(|p| matches!(p.as_str(), "active" | "upcoming" | "expired"))
        .unwrap_or_default();

    let rows: Vec<DealRowView> = deals
        .iter()
        .filter(|product| {
            phase_filter.is_empty() || product_phase(product, now).as_str() == phase_filter
        })
        .map(|product| DealRowView::from_product(product, now))
        .collect();

    Ok(DealsTemplate {
        admin: auth.admin,
        active: "deals",
        flash: take_flash(&session).await,
        counts,
        phase_filter,
        rows,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_phase_follows_the_window() {
        let start = Some(at("2026-03-01T00:00:00Z"));
        let end = Some(at("2026-03-14T00:00:00Z"));

        assert_eq!(
            deal_phase(start, end, at("2026-02-20T00:00:00Z")),
            DealPhase::Upcoming
        );
        assert_eq!(
            deal_phase(start, end, at("2026-03-07T00:00:00Z")),
            DealPhase::Active
        );
        assert_eq!(
            deal_phase(start, end, at("2026-04-01T00:00:00Z")),
            DealPhase::Expired
        );
        // A deal missing a boundary runs indefinitely
        assert_eq!(
            deal_phase(None, end, at("2026-04-01T00:00:00Z")),
            DealPhase::Active
        );
    }

    #[test]
    fn test_time_left_formats() {
        let end = Some(at("2026-03-04T10:00:00Z"));

        assert_eq!(time_left(end, at("2026-03-01T06:00:00Z")), "3d 4h left");
        assert_eq!(time_left(end, at("2026-03-04T05:00:00Z")), "5h left");
        assert_eq!(
            time_left(end, at("2026-03-04T09:30:00Z")),
            "Less than 1h left"
        );
        assert_eq!(time_left(end, at("2026-03-05T00:00:00Z")), "Expired");
        assert_eq!(time_left(None, at("2026-03-05T00:00:00Z")), "-");
    }

    #[test]
    fn test_parse_deal_date_tolerates_naive_timestamps() {
        assert!(parse_deal_date("2026-03-01T00:00:00+00:00").is_some());
        assert!(parse_deal_date("2026-03-01T08:30:00.123456").is_some());
        assert!(parse_deal_date("not a date").is_none());
    }

    #[test]
    fn test_row_view_from_product() {
        let product = serde_json::json!({
            "id": "p-1",
            "name": "Merlion Plush",
            "sku": "MG-001",
            "price": 24.90,
            "sale_price": 19.90,
            "is_on_deal": true,
            "deal_percentage": 20.0,
            "deal_start_date": "2026-03-01T00:00:00+00:00",
            "deal_end_date": "2026-03-14T00:00:00+00:00"
        });

        let row = DealRowView::from_product(&product, at("2026-03-07T00:00:00Z"));
        assert_eq!(row.name, "Merlion Plush");
        assert_eq!(row.price, "S$24.90");
        assert_eq!(row.sale_price, "S$19.90");
        assert_eq!(row.percentage, "20% off");
        assert_eq!(row.period, "2026-03-01 to 2026-03-14");
        assert_eq!(row.phase_label, "Active");
        assert_eq!(row.time_left, "7d 0h left");
        assert_eq!(row.edit_url, "/entities/products?edit=p-1");
    }

    #[test]
    fn test_dateless_deal_reads_as_running() {
        let product = serde_json::json!({
            "id": "p-2",
            "name": "Kaya Jam",
            "price": 8.50,
            "is_on_deal": true,
            "deal_percentage": 15.0
        });

        let row = DealRowView::from_product(&product, at("2026-03-07T00:00:00Z"));
        assert_eq!(row.phase_label, "Active (no dates)");
        assert_eq!(row.period, "No dates set");
        assert_eq!(row.time_left, "-");
        assert_eq!(row.sale_price, "");
    }
}
