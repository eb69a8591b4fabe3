//! Document types: whole-document predicates, pre-scans and their blocks.

use std::fmt;

use regex::Regex;

use super::block::Block;
use super::context::Context;
use crate::error::{ConfigError, ExtractionError};

/// Document-level pass seeding the context before any block runs.
pub type PreScan = Box<dyn Fn(&[String], &mut Context) -> Result<(), ExtractionError> + Send + Sync>;

/// One kind of document an institution issues.
///
/// A document belongs to the type when every marker occurs somewhere in its
/// text and no exclusion does.
pub struct DocumentType {
    name: String,
    markers: Vec<Regex>,
    exclusions: Vec<Regex>,
    pre_scan: Option<PreScan>,
    blocks: Vec<Block>,
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

impl DocumentType {
    /// Create a document type identified by `marker`.
    pub fn new(marker: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            name: marker.to_string(),
            markers: vec![compile(marker)?],
            exclusions: Vec::new(),
            pre_scan: None,
            blocks: Vec::new(),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Require an additional marker.
    pub fn including(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.markers.push(compile(pattern)?);
        Ok(self)
    }

    /// Reject documents containing `pattern`.
    pub fn excluding(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.exclusions.push(compile(pattern)?);
        Ok(self)
    }

    pub fn with_pre_scan<F>(mut self, pre_scan: F) -> Self
    where
        F: Fn(&[String], &mut Context) -> Result<(), ExtractionError> + Send + Sync + 'static,
    {
        self.pre_scan = Some(Box::new(pre_scan));
        self
    }

    /// Register a block; its transaction must be complete.
    pub fn add_block(mut self, block: Block) -> Result<Self, ConfigError> {
        block.ensure_complete()?;
        self.blocks.push(block);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn has_pre_scan(&self) -> bool {
        self.pre_scan.is_some()
    }

    /// Whether the whole document text belongs to this type.
    pub fn matches(&self, text: &str) -> bool {
        self.markers.iter().all(|marker| marker.is_match(text))
            && !self.exclusions.iter().any(|exclusion| exclusion.is_match(text))
    }

    /// Run the pre-scan, if any, over all lines.
    pub fn pre_scan(&self, lines: &[String], context: &mut Context) -> Result<(), ExtractionError> {
        match &self.pre_scan {
            Some(pre_scan) => pre_scan(lines, context),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentType")
            .field("name", &self.name)
            .field("markers", &self.markers.iter().map(Regex::as_str).collect::<Vec<_>>())
            .field("exclusions", &self.exclusions.iter().map(Regex::as_str).collect::<Vec<_>>())
            .field("pre_scan", &self.pre_scan.is_some())
            .field("blocks", &self.blocks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::money::CurrencyCode;
    use crate::parser::context::{keys, ContextValue};
    use crate::parser::section::Section;
    use crate::parser::transaction::TransactionBuilder;
    use crate::models::transaction::{Item, Transaction, TransactionKind};

    #[test]
    fn test_matches_is_unanchored_containment() {
        let kind = DocumentType::new("Wertpapier Abrechnung Kauf").unwrap();
        assert!(kind.matches("Seite 1\nWertpapier Abrechnung Kauf Nr. 12\nEnde"));
        assert!(!kind.matches("Wertpapier Abrechnung Verkauf"));
    }

    #[test]
    fn test_including_and_excluding() {
        let kind = DocumentType::new("Kontoauszug")
            .unwrap()
            .including("Santander")
            .unwrap()
            .excluding("Kreditkarte")
            .unwrap();
        assert!(kind.matches("Santander\nKontoauszug"));
        assert!(!kind.matches("Kontoauszug"));
        assert!(!kind.matches("Santander Kreditkarte\nKontoauszug"));
    }

    #[test]
    fn test_pre_scan_seeds_context() {
        let kind = DocumentType::new("Kontoauszug").unwrap().with_pre_scan(|lines, ctx| {
            if lines.iter().any(|l| l.starts_with('€')) {
                ctx.put(keys::CURRENCY, ContextValue::Currency(CurrencyCode::EUR));
            }
            Ok(())
        });
        let mut context = Context::default();
        kind.pre_scan(&["€ 0,00 € 38,98".to_string()], &mut context).unwrap();
        assert_eq!(context.currency(keys::CURRENCY).unwrap(), CurrencyCode::EUR);
    }

    #[test]
    fn test_add_block_requires_transaction() {
        let block = Block::new("^Einzahlung.*$").unwrap();
        assert!(DocumentType::new("Kontoauszug").unwrap().add_block(block).is_err());

        let builder = TransactionBuilder::new(|| Transaction::new(TransactionKind::Deposit))
            .section(
                Section::new(["note"]).matching(r"^Einzahlung (?<note>.*)$").unwrap(),
                |_: &mut Transaction, _, _| Ok(()),
            )
            .unwrap()
            .wrap(Item::new);
        let block = Block::new("^Einzahlung.*$").unwrap().set(builder).unwrap();
        let kind = DocumentType::new("Kontoauszug").unwrap().add_block(block).unwrap();
        assert_eq!(kind.blocks().len(), 1);
    }
}
