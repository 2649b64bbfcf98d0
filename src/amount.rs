//! Posting amount.
//!
//! Wraps `rust_decimal` so the amount written to the import CSV is exactly
//! the value the caller supplied, without a round trip through floats.

use crate::error::Rule;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// A strictly positive amount.
///
/// Display keeps the scale of the input, so `"10"` renders as `10` and
/// `"4444.20"` as `4444.20`.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use opus_invoice::Amount;
///
/// let amount = Amount::from_str("4444.22").unwrap();
/// assert_eq!(amount.to_string(), "4444.22");
/// assert!(Amount::from_str("0.0").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    /// Accepts `value` only if it is greater than zero.
    pub fn new(value: Decimal) -> Result<Self, Rule> {
        if value <= Decimal::ZERO {
            return Err(Rule::NotPositive(value.to_string()));
        }
        Ok(Amount(value))
    }

    /// Converts a JSON-style floating point number via its shortest
    /// decimal representation (`4444.22` stays `4444.22`).
    pub fn from_f64(value: f64) -> Result<Self, Rule> {
        Amount::from_str(&value.to_string())
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = Rule;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = match Decimal::from_str(trimmed) {
            Ok(decimal) => decimal,
            Err(_) => Decimal::from_scientific(trimmed).map_err(|_| unrepresentable(trimmed))?,
        };
        // Digits past the 28th decimal place are dropped while parsing.
        if decimal.is_zero() && approximate(trimmed).is_some_and(|n| n > 0.0) {
            return Err(Rule::OutOfRange(trimmed.to_string()));
        }
        Amount::new(decimal)
    }
}

fn approximate(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A numeric input `Decimal` cannot hold is out of range, anything else is
/// not a number.
fn unrepresentable(s: &str) -> Rule {
    match approximate(s) {
        Some(n) if n <= 0.0 => Rule::NotPositive(s.to_string()),
        Some(_) => Rule::OutOfRange(s.to_string()),
        None => Rule::NotANumber(s.to_string()),
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
