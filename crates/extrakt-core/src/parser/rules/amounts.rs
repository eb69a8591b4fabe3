//! Amount, share and rate parsing for locale-formatted numbers.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::NumberLocale;
use super::patterns::NUMBER_BODY;
use crate::error::ExtractionError;

/// Parse a locale-formatted number with an optional leading or trailing sign.
///
/// Documents print the sign apart from the magnitude (`317,96-`, `2,07+`),
/// so a single `+`/`-` is accepted at either end, but not at both.
pub fn parse_decimal(text: &str, locale: NumberLocale) -> Result<Decimal, ExtractionError> {
    let malformed = |reason: String| ExtractionError::malformed("number", text, reason);

    let (negative, body) =
        split_sign(text.trim()).ok_or_else(|| malformed("conflicting sign markers".to_string()))?;

    let mut normalized = String::with_capacity(body.len() + 1);
    let mut decimal_separators = 0;

    for c in body.chars() {
        if c.is_ascii_digit() {
            normalized.push(c);
        } else if c == locale.decimal() {
            decimal_separators += 1;
            normalized.push('.');
        } else if c == locale.grouping() || c.is_whitespace() {
            continue;
        } else {
            return Err(malformed(format!("unexpected character `{}`", c)));
        }
    }

    if decimal_separators > 1 {
        return Err(malformed("more than one decimal separator".to_string()));
    }

    // ",50" is a valid way to write 0.50
    if normalized.starts_with('.') {
        normalized.insert(0, '0');
    }

    if !NUMBER_BODY.is_match(&normalized) {
        return Err(malformed("no digits".to_string()));
    }

    let value = Decimal::from_str(&normalized).map_err(|e| malformed(e.to_string()))?;
    Ok(if negative { -value } else { value })
}

/// Parse a monetary amount, scaled to two decimal places.
pub fn parse_amount(text: &str, locale: NumberLocale) -> Result<Decimal, ExtractionError> {
    let value = parse_decimal(text, locale).map_err(|e| e.with_field("amount"))?;
    let mut value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(2);
    Ok(value)
}

/// Parse a share quantity; negative quantities are rejected.
pub fn parse_shares(text: &str, locale: NumberLocale) -> Result<Decimal, ExtractionError> {
    let value = parse_decimal(text, locale).map_err(|e| e.with_field("shares"))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ExtractionError::malformed(
            "shares",
            text,
            "share quantity must not be negative",
        ));
    }
    Ok(value.normalize())
}

/// Parse an exchange rate; it must be strictly positive.
pub fn parse_exchange_rate(text: &str, locale: NumberLocale) -> Result<Decimal, ExtractionError> {
    let value = parse_decimal(text, locale).map_err(|e| e.with_field("exchange rate"))?;
    if value <= Decimal::ZERO {
        return Err(ExtractionError::malformed(
            "exchange rate",
            text,
            "rate must be positive",
        ));
    }
    Ok(value)
}

fn split_sign(text: &str) -> Option<(bool, &str)> {
    let (leading, rest) = match text.chars().next() {
        Some('-') => (Some(true), &text[1..]),
        Some('+') => (Some(false), &text[1..]),
        _ => (None, text),
    };
    let (trailing, body) = match rest.chars().last() {
        Some('-') => (Some(true), &rest[..rest.len() - 1]),
        Some('+') => (Some(false), &rest[..rest.len() - 1]),
        _ => (None, rest),
    };

    match (leading, trailing) {
        (Some(_), Some(_)) => None,
        (Some(negative), None) | (None, Some(negative)) => Some((negative, body.trim())),
        (None, None) => Some((false, body)),
    }
}
