//! Prices as the reconciler sees them.
//!
//! Amounts are held in integer minor units. Only a decimal that is exactly
//! zero converts to zero, so a paid line is never mistaken for a gift.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CommerceError;

/// Currencies whose minor unit is the major unit.
const ZERO_DECIMAL: [&str; 8] = ["JPY", "KRW", "VND", "CLP", "ISK", "UGX", "XAF", "XOF"];

/// Currencies with a thousandth minor unit.
const THREE_DECIMAL: [&str; 7] = ["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// An ISO 4217 currency code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub const USD: Currency = Currency(*b"USD");
    pub const EUR: Currency = Currency(*b"EUR");
    pub const GBP: Currency = Currency(*b"GBP");
    pub const JPY: Currency = Currency(*b"JPY");

    /// Parse a three-letter code, case-insensitively.
    pub fn parse(code: &str) -> Result<Self, CommerceError> {
        let bytes = code.trim().as_bytes();
        match bytes {
            [a, b, c] if bytes.iter().all(u8::is_ascii_alphabetic) => Ok(Self([
                a.to_ascii_uppercase(),
                b.to_ascii_uppercase(),
                c.to_ascii_uppercase(),
            ])),
            _ => Err(CommerceError::MalformedCart(format!(
                "invalid currency code {code:?}"
            ))),
        }
    }

    /// The upper-case code.
    pub fn code(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("XXX")
    }

    /// Digits after the decimal point in the platform's decimal amounts.
    pub fn minor_digits(&self) -> u32 {
        let code = self.code();
        if ZERO_DECIMAL.contains(&code) {
            0
        } else if THREE_DECIMAL.contains(&code) {
            3
        } else {
            2
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::USD
    }
}

impl TryFrom<String> for Currency {
    type Error = CommerceError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::parse(&code)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An extended line price in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    pub minor_units: i64,
    pub currency: Currency,
}

impl Money {
    pub fn new(minor_units: i64, currency: Currency) -> Self {
        Self {
            minor_units,
            currency,
        }
    }

    /// Convert a decimal amount as sent by the platform.
    ///
    /// A non-zero amount smaller than one minor unit becomes one minor unit
    /// of the same sign rather than zero.
    ///
    /// ```
    /// use turbo_commerce::money::{Currency, Money};
    /// let price = Money::from_decimal(49.99, Currency::USD).unwrap();
    /// assert_eq!(price.minor_units, 4999);
    /// ```
    pub fn from_decimal(amount: f64, currency: Currency) -> Result<Self, CommerceError> {
        if !amount.is_finite() {
            return Err(CommerceError::MalformedCart(format!(
                "non-finite amount {amount}"
            )));
        }
        let scale = 10_f64.powi(currency.minor_digits() as i32);
        let mut minor_units = (amount * scale).round() as i64;
        if minor_units == 0 && amount != 0.0 {
            minor_units = if amount < 0.0 { -1 } else { 1 };
        }
        Ok(Self::new(minor_units, currency))
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Zero-priced lines are gift candidates.
    pub fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    pub fn is_negative(&self) -> bool {
        self.minor_units < 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.currency.minor_digits();
        if digits == 0 {
            return write!(f, "{} {}", self.minor_units, self.currency);
        }
        let scale = 10_i64.pow(digits);
        let sign = if self.minor_units < 0 { "-" } else { "" };
        let abs = self.minor_units.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            abs / scale as u64,
            abs % scale as u64,
            self.currency,
            width = digits as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_scales_by_currency() {
        assert_eq!(Money::from_decimal(49.99, Currency::USD).unwrap().minor_units, 4999);
        assert_eq!(Money::from_decimal(100.0, Currency::JPY).unwrap().minor_units, 100);
    }

    #[test]
    fn test_only_exact_zero_is_zero() {
        assert!(Money::from_decimal(0.0, Currency::USD).unwrap().is_zero());
        assert!(Money::from_decimal(-0.0, Currency::USD).unwrap().is_zero());
        assert_eq!(Money::from_decimal(0.004, Currency::USD).unwrap().minor_units, 1);
        assert_eq!(Money::from_decimal(0.0000001, Currency::JPY).unwrap().minor_units, 1);
        assert_eq!(Money::from_decimal(-0.001, Currency::EUR).unwrap().minor_units, -1);
    }

    #[test]
    fn test_three_decimal_currencies() {
        let kwd = Currency::parse("KWD").unwrap();
        assert_eq!(kwd.minor_digits(), 3);
        assert_eq!(Money::from_decimal(0.004, kwd).unwrap().minor_units, 4);
        assert_eq!(Money::from_decimal(1.25, kwd).unwrap().minor_units, 1250);
        assert_eq!(Money::new(1250, kwd).to_string(), "1.250 KWD");
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Money::from_decimal(f64::NAN, Currency::USD).is_err());
        assert!(Money::from_decimal(f64::INFINITY, Currency::USD).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(4999, Currency::USD).to_string(), "49.99 USD");
        assert_eq!(Money::new(-5, Currency::EUR).to_string(), "-0.05 EUR");
        assert_eq!(Money::new(100, Currency::JPY).to_string(), "100 JPY");
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("usd").unwrap(), Currency::USD);
        assert_eq!(Currency::parse("NZD").unwrap().code(), "NZD");
        assert!(Currency::parse("US").is_err());
        assert!(Currency::parse("U$D").is_err());
    }

    #[test]
    fn test_currency_serde_as_code() {
        assert_eq!(serde_json::to_string(&Currency::GBP).unwrap(), r#""GBP""#);
        let parsed: Currency = serde_json::from_str(r#""krw""#).unwrap();
        assert_eq!(parsed.minor_digits(), 0);
        assert!(serde_json::from_str::<Currency>(r#""toolong""#).is_err());
    }
}
