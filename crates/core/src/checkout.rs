//! Order totals: subtotal, coupon discounts, payable amount.
//!
//! These figures drive what the checkout page displays. The backend
//! recomputes everything from its own catalog when the payment session is
//! created, so nothing here is trusted for charging; it exists to show the
//! shopper the same numbers the backend will arrive at.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A priced line at checkout.
///
/// `unit_price` is the sale price when the product is on sale, otherwise
/// the list price; callers resolve that before building the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    #[must_use]
    pub const fn new(unit_price: Decimal, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of all line totals, in SGD.
#[must_use]
pub fn subtotal(lines: &[LineItem]) -> Decimal {
    lines.iter().map(LineItem::line_total).sum()
}

/// How a coupon reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` percent off the subtotal.
    Percentage,
    /// `discount_value` SGD off the subtotal.
    Fixed,
}

/// A coupon as returned by the validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_value: Decimal,
    /// Minimum subtotal required before the coupon applies. Zero when the
    /// coupon has no floor.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub min_purchase: Decimal,
}

/// Why a coupon could not be applied locally.
///
/// Validity itself (existence, expiry, active flag) is the backend's call;
/// the only check repeated here is the minimum-purchase floor, so the
/// shopper finds out without a round trip when their cart shrinks below it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponError {
    #[error("this coupon requires a minimum purchase of S${min_purchase:.2}")]
    MinPurchaseNotMet { min_purchase: Decimal },
}

impl Coupon {
    /// Discount this coupon grants on `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::MinPurchaseNotMet`] when the subtotal is under
    /// the coupon's minimum purchase.
    pub fn discount_for(&self, subtotal: Decimal) -> Result<Decimal, CouponError> {
        if subtotal < self.min_purchase {
            return Err(CouponError::MinPurchaseNotMet {
                min_purchase: self.min_purchase,
            });
        }

        Ok(match self.discount_type {
            DiscountType::Percentage => subtotal * self.discount_value / Decimal::ONE_HUNDRED,
            DiscountType::Fixed => self.discount_value,
        })
    }
}

/// Payable amount after a discount, floored at zero. A fixed coupon larger
/// than the subtotal makes the order free, never negative.
#[must_use]
pub fn order_total(subtotal: Decimal, discount: Decimal) -> Decimal {
    (subtotal - discount).max(Decimal::ZERO)
}

/// Subtotal, discount and payable total for a cart with an optional coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub coupon: Option<Coupon>,
}

impl CheckoutSummary {
    /// Totals for `lines` with no coupon applied.
    #[must_use]
    pub fn of(lines: &[LineItem]) -> Self {
        let subtotal = subtotal(lines);
        Self {
            subtotal,
            discount: Decimal::ZERO,
            total: subtotal,
            coupon: None,
        }
    }

    /// Apply a coupon, replacing any previously applied one.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::MinPurchaseNotMet`] and leaves the summary
    /// unchanged when the subtotal is under the coupon's floor.
    pub fn apply_coupon(&mut self, coupon: Coupon) -> Result<(), CouponError> {
        let discount = coupon.discount_for(self.subtotal)?;
        self.discount = discount;
        self.total = order_total(self.subtotal, discount);
        self.coupon = Some(coupon);
        Ok(())
    }

    /// Drop the applied coupon and restore the undiscounted total.
    pub fn remove_coupon(&mut self) {
        self.discount = Decimal::ZERO;
        self.total = self.subtotal;
        self.coupon = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn save10() -> Coupon {
        Coupon {
            code: "SAVE10".to_owned(),
            discount_type: DiscountType::Percentage,
            discount_value: dec("10"),
            min_purchase: dec("50"),
        }
    }

    #[test]
    fn test_subtotal_sums_line_totals() {
        let lines = [
            LineItem::new(dec("12.50"), 2),
            LineItem::new(dec("9.90"), 1),
        ];
        assert_eq!(subtotal(&lines), dec("34.90"));
    }

    #[test]
    fn test_empty_cart_subtotal_is_zero() {
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_percentage_coupon_applies_above_minimum() {
        let mut summary = CheckoutSummary::of(&[LineItem::new(dec("100"), 1)]);
        summary.apply_coupon(save10()).unwrap();

        assert_eq!(summary.subtotal, dec("100"));
        assert_eq!(summary.discount, dec("10"));
        assert_eq!(summary.total, dec("90"));
    }

    #[test]
    fn test_coupon_rejected_below_minimum_leaves_totals_unchanged() {
        let mut summary = CheckoutSummary::of(&[LineItem::new(dec("40"), 1)]);
        let err = summary.apply_coupon(save10()).unwrap_err();

        assert_eq!(
            err,
            CouponError::MinPurchaseNotMet {
                min_purchase: dec("50")
            }
        );
        assert_eq!(summary.discount, Decimal::ZERO);
        assert_eq!(summary.total, dec("40"));
        assert!(summary.coupon.is_none());
    }

    #[test]
    fn test_fixed_coupon_subtracts_flat_amount() {
        let mut summary = CheckoutSummary::of(&[LineItem::new(dec("80"), 1)]);
        summary
            .apply_coupon(Coupon {
                code: "FLAT15".to_owned(),
                discount_type: DiscountType::Fixed,
                discount_value: dec("15"),
                min_purchase: Decimal::ZERO,
            })
            .unwrap();

        assert_eq!(summary.total, dec("65"));
    }

    #[test]
    fn test_total_never_goes_negative() {
        let mut summary = CheckoutSummary::of(&[LineItem::new(dec("60"), 1)]);
        summary
            .apply_coupon(Coupon {
                code: "FLAT100".to_owned(),
                discount_type: DiscountType::Fixed,
                discount_value: dec("100"),
                min_purchase: Decimal::ZERO,
            })
            .unwrap();

        assert_eq!(summary.discount, dec("100"));
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_remove_coupon_restores_subtotal() {
        let mut summary = CheckoutSummary::of(&[LineItem::new(dec("100"), 1)]);
        summary.apply_coupon(save10()).unwrap();
        summary.remove_coupon();

        assert_eq!(summary.total, dec("100"));
        assert_eq!(summary.discount, Decimal::ZERO);
        assert!(summary.coupon.is_none());
    }

    #[test]
    fn test_reapplying_replaces_previous_coupon() {
        let mut summary = CheckoutSummary::of(&[LineItem::new(dec("100"), 1)]);
        summary.apply_coupon(save10()).unwrap();
        summary
            .apply_coupon(Coupon {
                code: "FLAT5".to_owned(),
                discount_type: DiscountType::Fixed,
                discount_value: dec("5"),
                min_purchase: Decimal::ZERO,
            })
            .unwrap();

        assert_eq!(summary.discount, dec("5"));
        assert_eq!(summary.total, dec("95"));
        assert_eq!(summary.coupon.unwrap().code, "FLAT5");
    }

    #[test]
    fn test_coupon_deserializes_from_validation_response() {
        let json = r#"{
            "code": "SAVE10",
            "discount_type": "percentage",
            "discount_value": 10.0,
            "min_purchase": 50.0
        }"#;
        let coupon: Coupon = serde_json::from_str(json).unwrap();
        assert_eq!(coupon, save10());
    }

    #[test]
    fn test_coupon_min_purchase_defaults_to_zero() {
        let json = r#"{"code": "FLAT5", "discount_type": "fixed", "discount_value": 5.0}"#;
        let coupon: Coupon = serde_json::from_str(json).unwrap();
        assert_eq!(coupon.min_purchase, Decimal::ZERO);
    }
}
