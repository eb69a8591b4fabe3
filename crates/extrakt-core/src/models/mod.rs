//! Data models: money, transactions, items, diagnostics and configuration.

pub mod config;
pub mod diagnostic;
pub mod money;
pub mod transaction;

pub use config::{ExtractionConfig, ExtraktConfig, InputConfig};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use money::{CurrencyCode, ExchangeRate, Money};
pub use transaction::{
    GrossUnit, Item, ItemSource, Security, Transaction, TransactionKind, Unit, UnitKind,
};
