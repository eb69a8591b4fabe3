//! Currency code and symbol coercion.

use crate::error::ExtractionError;
use crate::models::money::CurrencyCode;

/// Validate a three-letter currency code, normalizing it to uppercase.
pub fn parse_currency_code(text: &str) -> Result<CurrencyCode, ExtractionError> {
    text.parse()
}

/// Map a currency symbol to its code.
pub fn currency_from_symbol(symbol: &str) -> Option<CurrencyCode> {
    match symbol.trim() {
        "€" => Some(CurrencyCode::EUR),
        "$" | "US$" => Some(CurrencyCode::USD),
        "£" => Some(CurrencyCode::GBP),
        "¥" => Some(CurrencyCode::JPY),
        "Fr." | "SFr." => Some(CurrencyCode::CHF),
        _ => None,
    }
}

/// Accept either a currency symbol or a code.
pub fn parse_currency(text: &str) -> Result<CurrencyCode, ExtractionError> {
    match currency_from_symbol(text) {
        Some(code) => Ok(code),
        None => parse_currency_code(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("€").unwrap(), CurrencyCode::EUR);
        assert_eq!(parse_currency("usd").unwrap(), CurrencyCode::USD);
        assert_eq!(parse_currency("CHF").unwrap(), CurrencyCode::CHF);
        assert!(parse_currency("₿").is_err());
    }
}
