//! Gross-unit resolution and currency-aware fee/tax units.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::diagnostic::DiagnosticKind;
use crate::models::money::{ExchangeRate, Money};
use crate::models::transaction::{GrossUnit, Transaction, Unit, UnitKind};
use crate::parser::context::Context;

/// Rate implied by two gross amounts, oriented like `rate` (term per base).
///
/// `None` when the amounts are not in the rate's currencies or the divisor is zero.
pub fn implied_rate(rate: &ExchangeRate, gross: &Money, fx_gross: &Money) -> Option<Decimal> {
    let (base_amount, term_amount) =
        if rate.base == gross.currency && rate.term == fx_gross.currency {
            (gross.amount, fx_gross.amount)
        } else if rate.base == fx_gross.currency && rate.term == gross.currency {
            (fx_gross.amount, gross.amount)
        } else {
            return None;
        };

    if base_amount.is_zero() {
        return None;
    }
    term_amount.abs().checked_div(base_amount.abs())
}

/// Build the gross unit and cross-check the stated rate.
///
/// Returns the unit plus an optional rate-mismatch finding; fails only when
/// the rate does not link the two gross currencies at all.
pub fn resolve_gross_unit(
    gross: Money,
    fx_gross: Money,
    rate: ExchangeRate,
    tolerance: Decimal,
) -> Result<(GrossUnit, Option<DiagnosticKind>), DiagnosticKind> {
    if !rate.covers(gross.currency, fx_gross.currency) {
        return Err(DiagnosticKind::RateCurrencyMismatch {
            rate: rate.to_string(),
            gross: gross.currency,
            fx_gross: fx_gross.currency,
        });
    }

    let mismatch = implied_rate(&rate, &gross, &fx_gross)
        .filter(|computed| relative_deviation(rate.rate, *computed) > tolerance)
        .map(|computed| DiagnosticKind::RateMismatch {
            base: rate.base,
            term: rate.term,
            stated: rate.rate,
            computed: computed.round_dp(6),
        });

    let unit = GrossUnit {
        gross,
        fx_gross,
        exchange_rate: rate,
    };
    Ok((unit, mismatch))
}

/// Overflow counts as an unbounded deviation.
fn relative_deviation(stated: Decimal, computed: Decimal) -> Decimal {
    computed
        .checked_sub(stated)
        .and_then(|diff| diff.checked_div(stated))
        .map(|deviation| deviation.abs())
        .unwrap_or(Decimal::MAX)
}

/// Attach a gross unit when the document states a foreign gross amount.
///
/// Uses the exchange rate recorded in the context by an earlier assignment.
/// Same-currency pairs and documents without a rate are left alone.
pub fn check_and_set_gross_unit(
    transaction: &mut Transaction,
    gross: Money,
    fx_gross: Money,
    context: &mut Context,
) {
    if gross.currency == fx_gross.currency {
        return;
    }

    let Some(rate) = context.exchange_rate().copied() else {
        debug!("No exchange rate in context for {} / {}", gross, fx_gross);
        return;
    };

    match resolve_gross_unit(gross, fx_gross, rate, context.rate_tolerance()) {
        Ok((unit, mismatch)) => {
            if let Some(mismatch) = mismatch {
                warn!("Exchange rate {} disagrees with {} / {}", rate, gross, fx_gross);
                context.warn(mismatch);
            }
            transaction.gross_unit = Some(unit);
        }
        Err(kind) => {
            warn!("Exchange rate {} does not link {} and {}", rate, gross, fx_gross);
            context.warn(kind);
        }
    }
}

/// Add a fee unit, converting it into the transaction currency when needed.
pub fn add_fee(transaction: &mut Transaction, fee: Money, context: &Context) {
    add_converted_unit(transaction, UnitKind::Fee, fee, context);
}

/// Add a tax unit, converting it into the transaction currency when needed.
pub fn add_tax(transaction: &mut Transaction, tax: Money, context: &Context) {
    add_converted_unit(transaction, UnitKind::Tax, tax, context);
}

fn add_converted_unit(transaction: &mut Transaction, kind: UnitKind, money: Money, context: &Context) {
    let money = Money::new(money.currency, money.amount.abs());

    let target = match transaction.currency {
        Some(currency) if currency != money.currency => currency,
        _ => {
            transaction.add_unit(Unit::new(kind, money));
            return;
        }
    };

    let converted = context
        .exchange_rate()
        .filter(|rate| rate.covers(target, money.currency))
        .and_then(|rate| rate.convert(&money).map(|converted| (converted, rate.rate)));

    match converted {
        Some((converted, rate)) => {
            transaction.add_unit(Unit::new(kind, converted).with_fx(money, rate));
        }
        None => {
            debug!("No rate to convert {} into {}", money, target);
            transaction.add_unit(Unit::new(kind, money));
        }
    }
}
