//! Checkout route handlers.
//!
//! One page collects the shipping address, payment method and an optional
//! coupon. Card payments redirect to a hosted payment session; PayNow and
//! cash on delivery place the order directly and require a signed-in
//! account. Totals are computed in SGD and converted to the visitor's
//! display currency at render time.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use merlion_core::{CheckoutSummary, CurrencyCode, Email, PaymentMethod};

use crate::api::{
    ApiClient, CartEntry, CheckoutSessionCreate, OrderCreate, ShippingAddress,
};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{Authed, CurrencyPrefs, OptionalAuth};
use crate::models::{Flash, set_flash};
use crate::services::cart::{
    GuestCartLine, hydrate_guest_cart, line_items_from_entries, line_items_from_guest,
    order_items_from_entries, order_items_from_guest,
};
use crate::services::guest_cart::load_guest_cart;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// One order line in the checkout summary column.
#[derive(Clone)]
pub struct CheckoutLineView {
    pub name: String,
    pub quantity: u32,
    pub line_total: String,
}

/// Money block of the checkout page, pre-formatted in the display currency.
#[derive(Clone)]
pub struct TotalsView {
    pub subtotal: String,
    /// Formatted discount when a coupon is applied.
    pub discount: Option<String>,
    pub total: String,
    /// Applied coupon code, echoed as a hidden form field so the final
    /// submit carries it.
    pub coupon_code: Option<String>,
    /// Why the last coupon attempt was rejected.
    pub coupon_error: Option<String>,
}

impl TotalsView {
    fn from_summary(
        summary: &CheckoutSummary,
        currency: CurrencyCode,
        coupon_error: Option<String>,
    ) -> Self {
        Self {
            subtotal: currency.convert_and_format(summary.subtotal),
            discount: (summary.discount > Decimal::ZERO)
                .then(|| currency.convert_and_format(summary.discount)),
            total: currency.convert_and_format(summary.total),
            coupon_code: summary.coupon.as_ref().map(|c| c.code.clone()),
            coupon_error,
        }
    }
}

/// Payment method radio button.
pub struct PaymentOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

fn payment_options(selected: PaymentMethod) -> Vec<PaymentOptionView> {
    PaymentMethod::CHECKOUT_CHOICES
        .iter()
        .map(|method| PaymentOptionView {
            value: method.as_str(),
            label: method.label(),
            checked: *method == selected,
        })
        .collect()
}

/// Shipping address fields echoed back into the form on re-render.
#[derive(Clone, Default)]
pub struct AddressFormView {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub email: String,
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default)]
    pub email: Option<String>,
    pub payment_method: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

impl CheckoutForm {
    fn address_view(&self) -> AddressFormView {
        AddressFormView {
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            email: self.email.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub coupon_code: String,
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    /// Hosted payment session to look up, set by the payment redirect.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Order id for directly placed orders (PayNow, cash on delivery).
    #[serde(default)]
    pub order: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutShowTemplate {
    pub lines: Vec<CheckoutLineView>,
    pub totals: TotalsView,
    pub payments: Vec<PaymentOptionView>,
    pub form: AddressFormView,
    pub signed_in: bool,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_totals.html")]
pub struct CheckoutTotalsTemplate {
    pub totals: TotalsView,
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct OrderSuccessTemplate {
    pub settled: bool,
    pub order_id: Option<String>,
    pub amount: Option<String>,
    /// Set when the payment session could not be looked up; the page falls
    /// back to a generic confirmation.
    pub generic: bool,
}

// =============================================================================
// Cart loading
// =============================================================================

/// The items being checked out, from whichever cart the visitor has.
enum CheckoutCart {
    Backend(Vec<CartEntry>),
    Guest(Vec<GuestCartLine>),
}

impl CheckoutCart {
    fn is_empty(&self) -> bool {
        match self {
            Self::Backend(entries) => entries.is_empty(),
            Self::Guest(lines) => lines.is_empty(),
        }
    }

    fn line_items(&self) -> Vec<merlion_core::LineItem> {
        match self {
            Self::Backend(entries) => line_items_from_entries(entries),
            Self::Guest(lines) => line_items_from_guest(lines),
        }
    }

    fn order_items(&self) -> Vec<crate::api::OrderItem> {
        match self {
            Self::Backend(entries) => order_items_from_entries(entries),
            Self::Guest(lines) => order_items_from_guest(lines),
        }
    }

    fn line_views(&self, currency: CurrencyCode) -> Vec<CheckoutLineView> {
        match self {
            Self::Backend(entries) => entries
                .iter()
                .map(|entry| CheckoutLineView {
                    name: entry.product.name.clone(),
                    quantity: entry.cart_item.quantity,
                    line_total: currency.convert_and_format(
                        entry.product.effective_price()
                            * Decimal::from(entry.cart_item.quantity),
                    ),
                })
                .collect(),
            Self::Guest(lines) => lines
                .iter()
                .map(|line| CheckoutLineView {
                    name: line.product.name.clone(),
                    quantity: line.item.quantity,
                    line_total: currency.convert_and_format(
                        line.product.effective_price() * Decimal::from(line.item.quantity),
                    ),
                })
                .collect(),
        }
    }
}

/// Load the cart to check out. Backend failures propagate rather than
/// degrade; checking out against a cart we could not read risks charging
/// for the wrong items.
async fn load_checkout_cart(
    state: &AppState,
    session: &Session,
    auth: Option<&Authed>,
) -> Result<CheckoutCart> {
    if let Some(authed) = auth {
        let entries = state.api().cart(&authed.token).await?;
        return Ok(CheckoutCart::Backend(entries));
    }

    let cart = load_guest_cart(session).await;
    let lines = hydrate_guest_cart(state.api(), &cart).await;
    Ok(CheckoutCart::Guest(lines))
}

// =============================================================================
// Coupon resolution
// =============================================================================

/// Totals for `lines`, with `code` validated against the backend and
/// applied when it passes. A rejected coupon leaves the summary
/// undiscounted and carries the reason back for display.
async fn summarize(
    api: &ApiClient,
    lines: &[merlion_core::LineItem],
    code: Option<&str>,
) -> (CheckoutSummary, Option<String>) {
    let mut summary = CheckoutSummary::of(lines);

    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return (summary, None);
    };

    match api.validate_coupon(code).await {
        Ok(coupon) => match summary.apply_coupon(coupon) {
            Ok(()) => (summary, None),
            Err(e) => (summary, Some(e.to_string())),
        },
        Err(e) => {
            let message = e
                .user_detail()
                .map_or_else(
                    || {
                        tracing::warn!("Coupon validation failed: {}", e);
                        "Could not validate the coupon. Please try again.".to_owned()
                    },
                    ToOwned::to_owned,
                );
            (summary, Some(message))
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /checkout - shipping address, payment method and totals.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
) -> Result<Response> {
    let cart = load_checkout_cart(&state, &session, auth.as_ref()).await?;
    if cart.is_empty() {
        set_flash(&session, Flash::error("Your cart is empty.")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let summary = CheckoutSummary::of(&cart.line_items());

    let mut form = AddressFormView::default();
    if let Some(authed) = &auth {
        form.full_name = authed.user.name.clone();
    }

    Ok(CheckoutShowTemplate {
        lines: cart.line_views(currency),
        totals: TotalsView::from_summary(&summary, currency, None),
        payments: payment_options(PaymentMethod::CreditCard),
        form,
        signed_in: auth.is_some(),
        error: None,
    }
    .into_response())
}

/// POST /checkout/coupon - HTMX fragment refreshing the totals block.
#[instrument(skip(state, session, auth, form))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
    Form(form): Form<CouponForm>,
) -> Result<CheckoutTotalsTemplate> {
    let cart = load_checkout_cart(&state, &session, auth.as_ref()).await?;
    let (summary, coupon_error) =
        summarize(state.api(), &cart.line_items(), Some(&form.coupon_code)).await;

    Ok(CheckoutTotalsTemplate {
        totals: TotalsView::from_summary(&summary, currency, coupon_error),
    })
}

/// POST /checkout - start a hosted payment session or place the order.
#[instrument(skip(state, session, auth, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    CurrencyPrefs(currency): CurrencyPrefs,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = load_checkout_cart(&state, &session, auth.as_ref()).await?;
    if cart.is_empty() {
        set_flash(&session, Flash::error("Your cart is empty.")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let render_error = |error: String, totals: TotalsView| {
        CheckoutShowTemplate {
            lines: cart.line_views(currency),
            totals,
            payments: payment_options(
                form.payment_method
                    .parse()
                    .unwrap_or(PaymentMethod::CreditCard),
            ),
            form: form.address_view(),
            signed_in: auth.is_some(),
            error: Some(error),
        }
        .into_response()
    };

    let (summary, coupon_error) =
        summarize(state.api(), &cart.line_items(), form.coupon_code.as_deref()).await;
    let totals = TotalsView::from_summary(&summary, currency, coupon_error.clone());

    // A coupon the shopper expected to apply failing silently would charge
    // them full price, so it blocks the submit instead.
    if let Some(error) = coupon_error {
        return Ok(render_error(error, totals));
    }

    if let Some(error) = validate_address(&form, auth.is_some()) {
        return Ok(render_error(error, totals));
    }

    let Ok(method) = form.payment_method.parse::<PaymentMethod>() else {
        return Ok(render_error("Choose a payment method.".to_owned(), totals));
    };
    if !PaymentMethod::CHECKOUT_CHOICES.contains(&method) {
        return Ok(render_error("Choose a payment method.".to_owned(), totals));
    }

    let shipping_address = ShippingAddress {
        full_name: form.full_name.trim().to_owned(),
        phone: form.phone.trim().to_owned(),
        address: form.address.trim().to_owned(),
        city: form.city.trim().to_owned(),
        postal_code: form.postal_code.trim().to_owned(),
        email: match &auth {
            Some(_) => None,
            None => form.email.as_deref().map(|e| e.trim().to_owned()),
        },
    };

    match method {
        PaymentMethod::CreditCard => {
            let body = CheckoutSessionCreate {
                cart_items: cart.order_items(),
                shipping_address,
                currency: currency.code().to_lowercase(),
                frontend_origin: state.config().base_url.trim_end_matches('/').to_owned(),
                coupon_code: summary.coupon.as_ref().map(|c| c.code.clone()),
            };
            let token = auth.as_ref().map(|a| a.token.as_str());
            match state.api().create_checkout_session(token, &body).await {
                Ok(checkout) => {
                    add_breadcrumb("checkout", "Started hosted payment session", None);
                    Ok(Redirect::to(&checkout.url).into_response())
                }
                Err(e) => {
                    tracing::error!("Failed to create checkout session: {}", e);
                    Ok(render_error(
                        "Could not start the payment. Please try again.".to_owned(),
                        totals,
                    ))
                }
            }
        }
        PaymentMethod::Paynow | PaymentMethod::CashOnDelivery => {
            let Some(authed) = &auth else {
                set_flash(
                    &session,
                    Flash::error("Sign in to pay with PayNow or cash on delivery."),
                )
                .await;
                return Ok(Redirect::to("/login?next=/checkout").into_response());
            };

            let body = OrderCreate {
                items: cart.order_items(),
                total_amount: summary.total,
                shipping_address,
                payment_method: method,
            };
            match state.api().place_order(&authed.token, &body).await {
                Ok(order) => {
                    add_breadcrumb(
                        "checkout",
                        "Placed order",
                        Some(&[("order_id", order.id.as_str())]),
                    );
                    set_flash(&session, Flash::success("Order placed. Thank you!")).await;
                    Ok(Redirect::to(&format!("/order-success?order={}", order.id))
                        .into_response())
                }
                Err(e) => {
                    tracing::error!("Failed to place order: {}", e);
                    Ok(render_error(
                        "Could not place the order. Please try again.".to_owned(),
                        totals,
                    ))
                }
            }
        }
        PaymentMethod::Stripe => {
            Ok(render_error("Choose a payment method.".to_owned(), totals))
        }
    }
}

/// GET /order-success - confirmation after payment or direct placement.
#[instrument(skip(state, auth))]
pub async fn success(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<SuccessQuery>,
) -> Response {
    if let Some(session_id) = query.session_id.as_deref() {
        let token = auth.as_ref().map(|a| a.token.as_str());
        return match state.api().checkout_status(token, session_id).await {
            Ok(status) => OrderSuccessTemplate {
                settled: status.is_paid(),
                order_id: status.order_id.map(|id| id.into_inner()),
                amount: format_settled_amount(status.amount, status.currency.as_deref()),
                generic: false,
            }
            .into_response(),
            Err(e) => {
                // Guests cannot read session status once the backend has
                // bound the order to an account; fall back to a generic
                // confirmation rather than a broken thank-you page.
                tracing::warn!("Could not look up checkout session: {}", e);
                OrderSuccessTemplate {
                    settled: false,
                    order_id: None,
                    amount: None,
                    generic: true,
                }
                .into_response()
            }
        };
    }

    // Orders placed with an offline payment method are final as soon as the
    // backend accepts them.
    if let Some(order_id) = query.order {
        return OrderSuccessTemplate {
            settled: true,
            order_id: Some(order_id),
            amount: None,
            generic: false,
        }
        .into_response();
    }

    Redirect::to("/").into_response()
}

fn format_settled_amount(amount: Option<f64>, currency: Option<&str>) -> Option<String> {
    let amount = amount?;
    let code = currency.unwrap_or("sgd").to_uppercase();
    Some(format!("{code} {amount:.2}"))
}

/// First problem with the submitted address, if any.
fn validate_address(form: &CheckoutForm, signed_in: bool) -> Option<String> {
    if form.full_name.trim().is_empty() {
        return Some("Full name is required.".to_owned());
    }
    if form.phone.trim().is_empty() {
        return Some("Phone number is required.".to_owned());
    }
    if form.address.trim().is_empty() {
        return Some("Address is required.".to_owned());
    }
    if form.city.trim().is_empty() {
        return Some("City is required.".to_owned());
    }
    if form.postal_code.trim().is_empty() {
        return Some("Postal code is required.".to_owned());
    }

    if !signed_in {
        let email = form.email.as_deref().unwrap_or_default();
        if let Err(e) = Email::parse(email) {
            return Some(format!("Enter a valid email address: {e}."));
        }
    }

    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use merlion_core::{Coupon, DiscountType, LineItem};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn form(payment_method: &str) -> CheckoutForm {
        CheckoutForm {
            full_name: "Mei Lin".to_owned(),
            phone: "+65 8123 4567".to_owned(),
            address: "1 Raffles Place".to_owned(),
            city: "Singapore".to_owned(),
            postal_code: "048616".to_owned(),
            email: None,
            payment_method: payment_method.to_owned(),
            coupon_code: None,
        }
    }

    #[test]
    fn test_validate_address_accepts_signed_in_without_email() {
        assert_eq!(validate_address(&form("credit_card"), true), None);
    }

    #[test]
    fn test_validate_address_requires_guest_email() {
        let error = validate_address(&form("credit_card"), false).unwrap();
        assert!(error.contains("email"));

        let mut with_email = form("credit_card");
        with_email.email = Some("mei@example.com".to_owned());
        assert_eq!(validate_address(&with_email, false), None);
    }

    #[test]
    fn test_validate_address_rejects_blank_fields() {
        let mut blank_city = form("paynow");
        blank_city.city = "   ".to_owned();
        let error = validate_address(&blank_city, true).unwrap();
        assert!(error.contains("City"));
    }

    #[test]
    fn test_totals_view_formats_discount_in_display_currency() {
        let lines = vec![LineItem::new(dec("50.00"), 2)];
        let mut summary = CheckoutSummary::of(&lines);
        summary
            .apply_coupon(Coupon {
                code: "SAVE10".to_owned(),
                discount_type: DiscountType::Percentage,
                discount_value: dec("10"),
                min_purchase: Decimal::ZERO,
            })
            .unwrap();

        let view = TotalsView::from_summary(&summary, CurrencyCode::SGD, None);
        assert_eq!(view.subtotal, "S$100.00");
        assert_eq!(view.discount.as_deref(), Some("S$10.00"));
        assert_eq!(view.total, "S$90.00");
        assert_eq!(view.coupon_code.as_deref(), Some("SAVE10"));

        let usd = TotalsView::from_summary(&summary, CurrencyCode::USD, None);
        assert_eq!(usd.total, "$66.60");
    }

    #[test]
    fn test_totals_view_hides_zero_discount() {
        let lines = vec![LineItem::new(dec("12.00"), 1)];
        let summary = CheckoutSummary::of(&lines);
        let view = TotalsView::from_summary(&summary, CurrencyCode::SGD, None);
        assert!(view.discount.is_none());
        assert!(view.coupon_code.is_none());
    }

    #[test]
    fn test_payment_options_exclude_hosted_session_value() {
        let options = payment_options(PaymentMethod::Paynow);
        assert!(options.iter().all(|o| o.value != "stripe"));
        assert!(
            options
                .iter()
                .any(|o| o.value == "paynow" && o.checked)
        );
        assert!(
            options
                .iter()
                .any(|o| o.value == "credit_card" && !o.checked)
        );
    }

    #[test]
    fn test_format_settled_amount() {
        assert_eq!(
            format_settled_amount(Some(42.5), Some("usd")),
            Some("USD 42.50".to_owned())
        );
        assert_eq!(
            format_settled_amount(Some(18.0), None),
            Some("SGD 18.00".to_owned())
        );
        assert_eq!(format_settled_amount(None, Some("sgd")), None);
    }
}
