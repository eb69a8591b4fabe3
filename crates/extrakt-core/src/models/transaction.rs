//! Transaction candidates and the items they are wrapped into.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{CurrencyCode, ExchangeRate, Money};
use crate::error::ExtractionError;
use crate::parser::rules::combine_date_time;

/// Kind of financial transaction a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Security purchase.
    Purchase,
    /// Security sale.
    Sale,
    /// Dividend payment.
    Dividend,
    /// Tax charge.
    Tax,
    /// Tax refund.
    TaxRefund,
    /// Fee charge.
    Fee,
    /// Fee refund.
    FeeRefund,
    /// Interest credit.
    Interest,
    /// Interest charge.
    InterestCharge,
    /// Cash deposit.
    Deposit,
    /// Cash removal.
    Removal,
}

impl TransactionKind {
    /// Whether the transaction moves securities (and thus needs shares and a security).
    pub fn is_portfolio(&self) -> bool {
        matches!(self, Self::Purchase | Self::Sale)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Dividend => "dividend",
            Self::Tax => "tax",
            Self::TaxRefund => "tax refund",
            Self::Fee => "fee",
            Self::FeeRefund => "fee refund",
            Self::Interest => "interest",
            Self::InterestCharge => "interest charge",
            Self::Deposit => "deposit",
            Self::Removal => "removal",
        }
    }
}

/// Security referenced by a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// Security name, including any continuation line.
    pub name: String,

    /// International Securities Identification Number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,

    /// German securities identification number (Wertpapierkennnummer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wkn: Option<String>,

    /// Trading currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
}

/// Kind of a transaction unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Fee,
    Tax,
    GrossValue,
}

/// A fee, tax or gross-value component attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub kind: UnitKind,

    /// Amount in the transaction currency.
    pub amount: Money,

    /// Original amount when the document stated it in another currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_amount: Option<Money>,

    /// Rate used to convert `fx_amount` into `amount`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
}

impl Unit {
    pub fn new(kind: UnitKind, amount: Money) -> Self {
        Self {
            kind,
            amount,
            fx_amount: None,
            rate: None,
        }
    }

    pub fn with_fx(mut self, fx_amount: Money, rate: Decimal) -> Self {
        self.fx_amount = Some(fx_amount);
        self.rate = Some(rate);
        self
    }
}

/// Link between the settlement-currency gross amount and the foreign gross
/// amount stated on the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossUnit {
    /// Gross amount in the settlement currency.
    pub gross: Money,

    /// Gross amount in the foreign currency.
    pub fx_gross: Money,

    /// Rate stated on the document.
    pub exchange_rate: ExchangeRate,
}

/// Mutable transaction under construction by section assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub amount: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub shares: Option<Decimal>,
    pub security: Option<Security>,
    pub note: Option<String>,
    pub units: Vec<Unit>,
    pub gross_unit: Option<GrossUnit>,
}

impl Transaction {
    /// Create an empty candidate of the given kind.
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            date: None,
            time: None,
            amount: None,
            currency: None,
            shares: None,
            security: None,
            note: None,
            units: Vec::new(),
            gross_unit: None,
        }
    }

    /// Set date and, when present, time of day.
    ///
    /// A time set earlier by another section is kept if `time` is `None`.
    pub fn set_date_time(&mut self, date: NaiveDate, time: Option<NaiveTime>) {
        self.date = Some(date);
        if time.is_some() {
            self.time = time;
        }
    }

    /// Date and time combined into one instant; midnight when no time was captured.
    pub fn date_time(&self) -> Option<NaiveDateTime> {
        combine_date_time(self.date?, self.time).ok()
    }

    /// Amount and currency as one value.
    pub fn money(&self) -> Option<Money> {
        match (self.currency, self.amount) {
            (Some(currency), Some(amount)) => Some(Money::new(currency, amount)),
            _ => None,
        }
    }

    /// Append a unit, ignoring zero amounts.
    pub fn add_unit(&mut self, unit: Unit) {
        if !unit.amount.is_zero() {
            self.units.push(unit);
        }
    }

    /// Sum of all units of one kind.
    pub fn unit_sum(&self, kind: UnitKind) -> Decimal {
        unit_sum(&self.units, kind)
    }

    /// Check the candidate carries everything an item needs.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.date.is_none() {
            return Err(ExtractionError::MissingField("date".to_string()));
        }
        if self.amount.is_none() {
            return Err(ExtractionError::MissingField("amount".to_string()));
        }
        if self.currency.is_none() {
            return Err(ExtractionError::MissingField("currency".to_string()));
        }
        if self.kind.is_portfolio() {
            if self.security.is_none() {
                return Err(ExtractionError::MissingField("security".to_string()));
            }
            if self.shares.is_none() {
                return Err(ExtractionError::MissingField("shares".to_string()));
            }
        }
        Ok(())
    }
}

fn unit_sum(units: &[Unit], kind: UnitKind) -> Decimal {
    units
        .iter()
        .filter(|u| u.kind == kind)
        .map(|u| u.amount.amount)
        .sum()
}

/// Where an item was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSource {
    pub document: String,
    pub institution: String,
    pub document_type: String,
    pub block: String,
    /// 1-based line number of the block trigger.
    pub line: usize,
}

/// Immutable wrapper around a completed transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    kind: TransactionKind,
    date_time: NaiveDateTime,
    amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    shares: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    security: Option<Security>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    units: Vec<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gross_unit: Option<GrossUnit>,
    source: ItemSource,
}

impl Item {
    /// Wrap a finished transaction, validating it first.
    pub fn new(transaction: Transaction) -> Result<Self, ExtractionError> {
        transaction.validate()?;

        let date_time = transaction
            .date_time()
            .ok_or_else(|| ExtractionError::MissingField("date".to_string()))?;
        let amount = transaction
            .money()
            .ok_or_else(|| ExtractionError::MissingField("amount".to_string()))?;

        Ok(Self {
            kind: transaction.kind,
            date_time,
            amount,
            shares: transaction.shares,
            security: transaction.security,
            note: transaction.note,
            units: transaction.units,
            gross_unit: transaction.gross_unit,
            source: ItemSource::default(),
        })
    }

    pub(crate) fn with_source(mut self, source: ItemSource) -> Self {
        self.source = source;
        self
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn date_time(&self) -> NaiveDateTime {
        self.date_time
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn shares(&self) -> Option<Decimal> {
        self.shares
    }

    pub fn security(&self) -> Option<&Security> {
        self.security.as_ref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Sum of all units of one kind.
    pub fn unit_sum(&self, kind: UnitKind) -> Decimal {
        unit_sum(&self.units, kind)
    }

    pub fn gross_unit(&self) -> Option<&GrossUnit> {
        self.gross_unit.as_ref()
    }

    pub fn source(&self) -> &ItemSource {
        &self.source
    }
}
