//! Core library for bank and broker document extraction.
//!
//! This crate provides:
//! - Documents as ordered line sequences (from text or, with the `pdf`
//!   feature, from PDF files)
//! - A declarative engine: institutions, document types, blocks and ordered
//!   line sections with named captures
//! - Value coercion for German-style amounts, dates, currencies and shares
//! - Exchange-rate cross-checks and fee/tax units
//! - Bundled institution definitions

pub mod document;
pub mod error;
pub mod institutions;
pub mod models;
pub mod parser;
#[cfg(feature = "pdf")]
pub mod pdf;

pub use document::{Document, LineRange};
pub use error::{ConfigError, ExtractionError, ExtraktError, PdfError, Result};
pub use models::config::{ExtractionConfig, ExtraktConfig, InputConfig};
pub use models::diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use models::money::{CurrencyCode, ExchangeRate, Money};
pub use models::transaction::{
    GrossUnit, Item, ItemSource, Security, Transaction, TransactionKind, Unit, UnitKind,
};
pub use parser::{
    Block, CaptureMap, Context, ContextValue, DocumentType, ExtractionResult, Extractor,
    Institution, NumberLocale, Section, TransactionBuilder,
};
#[cfg(feature = "pdf")]
pub use pdf::{PdfExtractor, PdfProcessor, PdfType};
