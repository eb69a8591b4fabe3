//! Per-document context shared by the pre-scan and section assignments.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::rules::NumberLocale;
use crate::error::ExtractionError;
use crate::models::config::DEFAULT_RATE_TOLERANCE;
use crate::models::diagnostic::DiagnosticKind;
use crate::models::money::{CurrencyCode, ExchangeRate};

/// Well-known context keys.
pub mod keys {
    /// Statement-wide currency detected by a pre-scan.
    pub const CURRENCY: &str = "currency";
    /// Exchange rate stated on the document.
    pub const EXCHANGE_RATE: &str = "exchange_rate";
    /// Set once a withheld tax was booked for the current block instance.
    pub const WITHHOLDING_TAX: &str = "withholding_tax";
}

/// A typed context value.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Flag(bool),
    Currency(CurrencyCode),
    Decimal(Decimal),
    ExchangeRate(ExchangeRate),
}

impl ContextValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContextValue::Flag(_) => "flag",
            ContextValue::Currency(_) => "currency",
            ContextValue::Decimal(_) => "decimal",
            ContextValue::ExchangeRate(_) => "exchange rate",
        }
    }
}

/// Key/value store scoped to one document and one matched document type.
///
/// The pre-scan fills it before any block runs; assignments may read and
/// extend it. Non-fatal findings raised by assignments are parked here until
/// the engine attaches them to the block instance that produced them.
#[derive(Debug, Clone)]
pub struct Context {
    values: BTreeMap<String, ContextValue>,
    locale: NumberLocale,
    rate_tolerance: Decimal,
    warnings: Vec<DiagnosticKind>,
}

impl Context {
    pub fn new(locale: NumberLocale, rate_tolerance: Decimal) -> Self {
        Self {
            values: BTreeMap::new(),
            locale,
            rate_tolerance,
            warnings: Vec::new(),
        }
    }

    /// Number format of the document this context belongs to.
    pub fn locale(&self) -> NumberLocale {
        self.locale
    }

    /// Relative tolerance for exchange-rate cross-checks.
    pub fn rate_tolerance(&self) -> Decimal {
        self.rate_tolerance
    }

    /// Store a value, returning the previous one.
    pub fn put(&mut self, key: impl Into<String>, value: ContextValue) -> Option<ContextValue> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, key: &str) -> Result<&ContextValue, ExtractionError> {
        self.values
            .get(key)
            .ok_or_else(|| ExtractionError::MissingContext(key.to_string()))
    }

    fn mistyped(key: &str, expected: &'static str, actual: &ContextValue) -> ExtractionError {
        ExtractionError::ContextType {
            key: key.to_string(),
            expected,
            actual: actual.type_name(),
        }
    }

    /// A flag; unset flags read as `false`.
    pub fn flag(&self, key: &str) -> Result<bool, ExtractionError> {
        match self.values.get(key) {
            None => Ok(false),
            Some(ContextValue::Flag(flag)) => Ok(*flag),
            Some(other) => Err(Self::mistyped(key, "flag", other)),
        }
    }

    pub fn currency(&self, key: &str) -> Result<CurrencyCode, ExtractionError> {
        match self.require(key)? {
            ContextValue::Currency(code) => Ok(*code),
            other => Err(Self::mistyped(key, "currency", other)),
        }
    }

    pub fn decimal(&self, key: &str) -> Result<Decimal, ExtractionError> {
        match self.require(key)? {
            ContextValue::Decimal(value) => Ok(*value),
            other => Err(Self::mistyped(key, "decimal", other)),
        }
    }

    /// Record the exchange rate stated on the document.
    pub fn put_exchange_rate(&mut self, rate: ExchangeRate) {
        self.put(keys::EXCHANGE_RATE, ContextValue::ExchangeRate(rate));
    }

    /// The exchange rate stated on the document, if any.
    pub fn exchange_rate(&self) -> Option<&ExchangeRate> {
        match self.values.get(keys::EXCHANGE_RATE) {
            Some(ContextValue::ExchangeRate(rate)) => Some(rate),
            _ => None,
        }
    }

    /// Park a non-fatal finding for the current block instance.
    pub fn warn(&mut self, kind: DiagnosticKind) {
        self.warnings.push(kind);
    }

    /// Drain findings parked since the last call.
    pub fn take_warnings(&mut self) -> Vec<DiagnosticKind> {
        std::mem::take(&mut self.warnings)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(NumberLocale::default(), DEFAULT_RATE_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typed_access() {
        let mut context = Context::default();
        context.put(keys::CURRENCY, ContextValue::Currency(CurrencyCode::EUR));

        assert_eq!(context.currency(keys::CURRENCY).unwrap(), CurrencyCode::EUR);
        assert_eq!(
            context.decimal(keys::CURRENCY).unwrap_err(),
            ExtractionError::ContextType {
                key: "currency".to_string(),
                expected: "decimal",
                actual: "currency",
            }
        );
        assert_eq!(
            context.decimal("rate").unwrap_err(),
            ExtractionError::MissingContext("rate".to_string())
        );
    }

    #[test]
    fn test_flags_default_to_false() {
        let mut context = Context::default();
        assert!(!context.flag(keys::WITHHOLDING_TAX).unwrap());
        context.put(keys::WITHHOLDING_TAX, ContextValue::Flag(true));
        assert!(context.flag(keys::WITHHOLDING_TAX).unwrap());

        context.put(keys::EXCHANGE_RATE, ContextValue::Decimal(Decimal::ONE));
        assert!(context.flag(keys::EXCHANGE_RATE).is_err());
    }

    #[test]
    fn test_exchange_rate_slot() {
        let mut context = Context::default();
        assert!(context.exchange_rate().is_none());

        let rate = ExchangeRate::new(CurrencyCode::EUR, CurrencyCode::USD, Decimal::new(12137, 4));
        context.put_exchange_rate(rate);
        assert_eq!(context.exchange_rate(), Some(&rate));
    }

    #[test]
    fn test_warnings_are_drained() {
        let mut context = Context::default();
        context.warn(DiagnosticKind::Unclassified);
        assert_eq!(context.take_warnings().len(), 1);
        assert!(context.take_warnings().is_empty());
    }
}
