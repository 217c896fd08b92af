//! Display-currency conversion for catalog prices.
//!
//! Every price the backend stores is in Singapore dollars. Shoppers pick a
//! display currency and all rendered prices are converted against a fixed
//! rate table at render time. The rates are a business constant reviewed by
//! the merchandising team, not a live feed; the backend keeps charging in
//! the checkout currency it is given.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

/// A supported display currency.
///
/// Unknown codes never fail: anything outside this set falls back to
/// [`CurrencyCode::SGD`], so a stale or hand-edited session value degrades
/// to base prices instead of an error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[allow(clippy::upper_case_acronyms)]
pub enum CurrencyCode {
    #[default]
    SGD,
    USD,
    EUR,
    GBP,
    AUD,
    MYR,
    INR,
}

impl CurrencyCode {
    /// All supported currencies, in the order the selector shows them.
    pub const ALL: [Self; 7] = [
        Self::SGD,
        Self::USD,
        Self::EUR,
        Self::GBP,
        Self::AUD,
        Self::MYR,
        Self::INR,
    ];

    /// Parse a currency code, falling back to SGD for anything unknown.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "USD" => Self::USD,
            "EUR" => Self::EUR,
            "GBP" => Self::GBP,
            "AUD" => Self::AUD,
            "MYR" => Self::MYR,
            "INR" => Self::INR,
            _ => Self::SGD,
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SGD => "SGD",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::AUD => "AUD",
            Self::MYR => "MYR",
            Self::INR => "INR",
        }
    }

    /// Symbol used as the price prefix.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::SGD => "S$",
            Self::USD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
            Self::AUD => "A$",
            Self::MYR => "RM",
            Self::INR => "\u{20b9}",
        }
    }

    /// Human-readable name for the currency selector.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SGD => "Singapore Dollar",
            Self::USD => "US Dollar",
            Self::EUR => "Euro",
            Self::GBP => "British Pound",
            Self::AUD => "Australian Dollar",
            Self::MYR => "Malaysian Ringgit",
            Self::INR => "Indian Rupee",
        }
    }

    /// Exchange rate from SGD into this currency.
    #[must_use]
    pub fn rate(self) -> Decimal {
        match self {
            Self::SGD => Decimal::ONE,
            Self::USD => Decimal::new(74, 2),
            Self::EUR => Decimal::new(68, 2),
            Self::GBP => Decimal::new(58, 2),
            Self::AUD => Decimal::new(114, 2),
            Self::MYR => Decimal::new(345, 2),
            Self::INR => Decimal::new(6150, 2),
        }
    }

    /// Convert an SGD price into this currency, rounded to two decimal
    /// places with ties away from zero.
    #[must_use]
    pub fn convert(self, price_in_sgd: Decimal) -> Decimal {
        (price_in_sgd * self.rate())
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format an already-converted amount with this currency's symbol.
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        format!("{}{amount:.2}", self.symbol())
    }

    /// Convert an SGD price and format it for display in one step.
    #[must_use]
    pub fn convert_and_format(self, price_in_sgd: Decimal) -> String {
        self.format(self.convert(price_in_sgd))
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// Deserialization shares the fallback: a session or query value with an
// unknown code reads as SGD rather than failing the request.
impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from_code(&code))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_is_sgd() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::SGD);
    }

    #[test]
    fn test_from_code_known() {
        assert_eq!(CurrencyCode::from_code("USD"), CurrencyCode::USD);
        assert_eq!(CurrencyCode::from_code("myr"), CurrencyCode::MYR);
        assert_eq!(CurrencyCode::from_code("Inr"), CurrencyCode::INR);
    }

    #[test]
    fn test_from_code_unknown_falls_back_to_sgd() {
        assert_eq!(CurrencyCode::from_code("XYZ"), CurrencyCode::SGD);
        assert_eq!(CurrencyCode::from_code(""), CurrencyCode::SGD);
        assert_eq!(CurrencyCode::from_code("BTC"), CurrencyCode::SGD);
    }

    #[test]
    fn test_rates() {
        assert_eq!(CurrencyCode::SGD.rate(), Decimal::ONE);
        assert_eq!(CurrencyCode::USD.rate(), dec("0.74"));
        assert_eq!(CurrencyCode::EUR.rate(), dec("0.68"));
        assert_eq!(CurrencyCode::GBP.rate(), dec("0.58"));
        assert_eq!(CurrencyCode::AUD.rate(), dec("1.14"));
        assert_eq!(CurrencyCode::MYR.rate(), dec("3.45"));
        assert_eq!(CurrencyCode::INR.rate(), dec("61.50"));
    }

    #[test]
    fn test_convert_and_format_usd() {
        assert_eq!(CurrencyCode::USD.convert_and_format(dec("10.00")), "$7.40");
        assert_eq!(
            CurrencyCode::USD.convert_and_format(dec("20.00")),
            "$14.80"
        );
    }

    #[test]
    fn test_convert_and_format_inr() {
        assert_eq!(
            CurrencyCode::INR.convert_and_format(dec("10.00")),
            "\u{20b9}615.00"
        );
    }

    #[test]
    fn test_sgd_is_identity() {
        assert_eq!(
            CurrencyCode::SGD.convert_and_format(dec("12.50")),
            "S$12.50"
        );
    }

    #[test]
    fn test_rounds_midpoint_away_from_zero() {
        // 13.25 * 0.74 = 9.8050 exactly
        assert_eq!(CurrencyCode::USD.convert(dec("13.25")), dec("9.81"));
    }

    #[test]
    fn test_format_pads_to_two_decimals() {
        assert_eq!(CurrencyCode::SGD.format(dec("5")), "S$5.00");
        assert_eq!(CurrencyCode::MYR.format(dec("3.4")), "RM3.40");
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&CurrencyCode::EUR).unwrap();
        assert_eq!(json, "\"EUR\"");

        let parsed: CurrencyCode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, CurrencyCode::EUR);
    }

    #[test]
    fn test_deserialize_unknown_falls_back() {
        let parsed: CurrencyCode = serde_json::from_str("\"DOGE\"").unwrap();
        assert_eq!(parsed, CurrencyCode::SGD);
    }
}
