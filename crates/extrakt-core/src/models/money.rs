//! Currency codes, monetary amounts and exchange rates.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// ISO 4217 style currency code: exactly three uppercase ASCII letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    pub const EUR: CurrencyCode = CurrencyCode(*b"EUR");
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");
    pub const GBP: CurrencyCode = CurrencyCode(*b"GBP");
    pub const CHF: CurrencyCode = CurrencyCode(*b"CHF");
    pub const JPY: CurrencyCode = CurrencyCode(*b"JPY");

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ever built from validated ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for CurrencyCode {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();

        if bytes.len() != 3 {
            return Err(ExtractionError::malformed(
                "currency",
                s,
                "expected exactly 3 letters",
            ));
        }
        if !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(ExtractionError::malformed(
                "currency",
                s,
                "currency codes contain letters only",
            ));
        }

        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ExtractionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exact amount in a given currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub currency: CurrencyCode,
    pub amount: Decimal,
}

impl Money {
    pub fn new(currency: CurrencyCode, amount: Decimal) -> Self {
        Self { currency, amount }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// A stated conversion rate: one unit of `base` equals `rate` units of `term`.
///
/// Documents print it as `Devisenkurs EUR / USD 1,2137`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base: CurrencyCode,
    pub term: CurrencyCode,
    pub rate: Decimal,
}

impl ExchangeRate {
    pub fn new(base: CurrencyCode, term: CurrencyCode, rate: Decimal) -> Self {
        Self { base, term, rate }
    }

    /// Whether the rate links exactly these two currencies, in any direction.
    pub fn covers(&self, a: CurrencyCode, b: CurrencyCode) -> bool {
        (self.base == a && self.term == b) || (self.base == b && self.term == a)
    }

    /// Convert `money` into the other currency of this rate, rounded to cents.
    ///
    /// Returns `None` when the money is in neither currency, the rate is zero,
    /// or the result does not fit a `Decimal`.
    pub fn convert(&self, money: &Money) -> Option<Money> {
        if self.rate.is_zero() {
            return None;
        }

        let (currency, amount) = if money.currency == self.base {
            (self.term, money.amount.checked_mul(self.rate)?)
        } else if money.currency == self.term {
            (self.base, money.amount.checked_div(self.rate)?)
        } else {
            return None;
        };

        Some(Money::new(
            currency,
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        ))
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.base, self.term, self.rate)
    }
}
