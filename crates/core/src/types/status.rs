//! Status enums shared across the storefront and admin.

use serde::{Deserialize, Serialize};

/// Lifecycle of an order as the fulfilment team tracks it.
///
/// The wire values are lowercase snake case, matching what the backend
/// stores and what its status-update endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order. Drives the admin status dropdown.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire value accepted by the order-status endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Label shown in status badges.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// How an order is paid.
///
/// `Stripe` is written by the backend when an order is created from a paid
/// payment session; the other three are what the checkout form offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Paynow,
    CashOnDelivery,
    Stripe,
}

impl PaymentMethod {
    /// Methods offered on the checkout form, in display order.
    pub const CHECKOUT_CHOICES: [Self; 3] = [Self::CreditCard, Self::Paynow, Self::CashOnDelivery];

    /// Wire value sent with the order.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::Paynow => "paynow",
            Self::CashOnDelivery => "cash_on_delivery",
            Self::Stripe => "stripe",
        }
    }

    /// Label shown next to the radio button and on order history.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreditCard => "Credit / Debit Card",
            Self::Paynow => "PayNow",
            Self::CashOnDelivery => "Cash on Delivery",
            Self::Stripe => "Paid Online",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(Self::CreditCard),
            "paynow" => Ok(Self::Paynow),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            "stripe" => Ok(Self::Stripe),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_values() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");

        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_order_status_from_str_rejects_unknown() {
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert_eq!(
            "processing".parse::<OrderStatus>().unwrap(),
            OrderStatus::Processing
        );
    }

    #[test]
    fn test_payment_method_wire_values() {
        assert_eq!(PaymentMethod::CashOnDelivery.as_str(), "cash_on_delivery");

        let parsed: PaymentMethod = serde_json::from_str("\"stripe\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Stripe);
    }

    #[test]
    fn test_checkout_choices_exclude_stripe() {
        assert!(
            !PaymentMethod::CHECKOUT_CHOICES.contains(&PaymentMethod::Stripe)
        );
    }
}
