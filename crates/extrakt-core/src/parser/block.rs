//! Blocks: trigger patterns delimiting transaction candidates.

use std::fmt;

use regex::Regex;

use super::context::Context;
use super::section::compile_line_pattern;
use super::transaction::TransactionBuilder;
use crate::document::LineRange;
use crate::error::{ConfigError, ExtractionError};
use crate::models::transaction::Item;

/// Type-erased transaction attached to a block.
pub trait BlockTransaction: Send + Sync {
    /// Build the item for one block instance.
    fn run(
        &self,
        lines: &[String],
        range: LineRange,
        context: &mut Context,
    ) -> Result<Item, ExtractionError>;

    fn is_complete(&self) -> bool;
}

/// A trigger pattern whose every matching line starts one candidate.
///
/// An instance owns the lines from its trigger up to (excluding) the next
/// trigger of the same block, the first end-boundary line after it, or
/// `start + max_lines`, whichever comes first.
pub struct Block {
    name: String,
    trigger: Regex,
    trigger_source: String,
    end: Option<Regex>,
    max_lines: Option<usize>,
    transaction: Option<Box<dyn BlockTransaction>>,
}

impl Block {
    /// Create a block triggered by lines fully matching `pattern`.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            name: pattern.to_string(),
            trigger: compile_line_pattern(pattern)?,
            trigger_source: pattern.to_string(),
            end: None,
            max_lines: None,
            transaction: None,
        })
    }

    /// Name used in diagnostics instead of the trigger pattern.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Close each instance at the first following line matching `pattern`.
    pub fn ending_at(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.end = Some(compile_line_pattern(pattern)?);
        Ok(self)
    }

    /// Cap every instance at `max_lines` lines.
    pub fn max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = Some(max_lines.max(1));
        self
    }

    /// Attach the transaction built for each instance.
    pub fn set<T: 'static>(mut self, builder: TransactionBuilder<T>) -> Result<Self, ConfigError> {
        if !builder.is_complete() {
            return Err(ConfigError::MissingTransaction(self.name));
        }
        self.transaction = Some(Box::new(builder));
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &str {
        &self.trigger_source
    }

    pub(crate) fn ensure_complete(&self) -> Result<(), ConfigError> {
        match &self.transaction {
            Some(transaction) if transaction.is_complete() => Ok(()),
            _ => Err(ConfigError::MissingTransaction(self.name.clone())),
        }
    }

    /// Ranges of all instances of this block, top to bottom.
    pub fn instances(&self, lines: &[String]) -> Vec<LineRange> {
        let mut triggers = Vec::new();
        let mut boundaries = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if self.trigger.is_match(line) {
                triggers.push(index);
            } else if self.end.as_ref().is_some_and(|end| end.is_match(line)) {
                boundaries.push(index);
            }
        }

        let mut boundary = boundaries.iter().peekable();
        triggers
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let mut end = triggers.get(i + 1).copied().unwrap_or(lines.len());

                while boundary.next_if(|&&b| b <= start).is_some() {}
                if let Some(&&b) = boundary.peek() {
                    end = end.min(b);
                }
                if let Some(max) = self.max_lines {
                    end = end.min(start + max);
                }
                LineRange::new(start, end)
            })
            .collect()
    }

    /// Build the item of one instance.
    pub fn extract(
        &self,
        lines: &[String],
        range: LineRange,
        context: &mut Context,
    ) -> Result<Item, ExtractionError> {
        match &self.transaction {
            Some(transaction) => transaction.run(lines, range, context),
            None => Err(ExtractionError::MissingField("transaction".to_string())),
        }
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("name", &self.name)
            .field("trigger", &self.trigger_source)
            .field("end", &self.end.as_ref().map(Regex::as_str))
            .field("max_lines", &self.max_lines)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::{Transaction, TransactionKind};
    use crate::parser::section::Section;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim().to_string()).collect()
    }

    fn ranges(block: &Block, doc: &[String]) -> Vec<(usize, usize)> {
        block
            .instances(doc)
            .into_iter()
            .map(|r| (r.start, r.end))
            .collect()
    }

    #[test]
    fn test_instances_run_to_next_trigger() {
        let doc = lines(
            "Kopf
             Dividendengutschrift
             a
             Dividendengutschrift
             b
             c",
        );
        let block = Block::new("^Dividendengutschrift$").unwrap();
        assert_eq!(ranges(&block, &doc), [(1, 3), (3, 6)]);
    }

    #[test]
    fn test_trigger_must_match_whole_line() {
        let doc = lines(
            "Dividendengutschrift 2,96 USD 2,44+ EUR
             Dividendengutschrift",
        );
        let block = Block::new("Dividendengutschrift").unwrap();
        assert_eq!(ranges(&block, &doc), [(1, 2)]);
    }

    #[test]
    fn test_end_boundary_closes_instance() {
        let doc = lines(
            "Buchung
             a
             Saldo
             b
             Buchung
             c",
        );
        let block = Block::new("^Buchung$").unwrap().ending_at("^Saldo$").unwrap();
        assert_eq!(ranges(&block, &doc), [(0, 2), (4, 6)]);
    }

    #[test]
    fn test_max_lines_caps_instance() {
        let doc = lines("X\na\nb\nc\nX\nd");
        let block = Block::new("^X$").unwrap().max_lines(2);
        assert_eq!(ranges(&block, &doc), [(0, 2), (4, 6)]);
    }

    #[test]
    fn test_instances_never_span_two_triggers() {
        let doc = lines("X\nX\nX");
        let block = Block::new("^X$").unwrap().ending_at("^Y$").unwrap();
        let found = block.instances(&doc);
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_set_rejects_incomplete_builder() {
        let builder = TransactionBuilder::new(|| Transaction::new(TransactionKind::Fee))
            .section(
                Section::new(["fee"]).matching(r"^Provision (?<fee>.*)$").unwrap(),
                |_: &mut Transaction, _, _| Ok(()),
            )
            .unwrap();
        let result = Block::new("^Provision.*$").unwrap().named("fee").set(builder);
        assert!(matches!(result, Err(ConfigError::MissingTransaction(name)) if name == "fee"));
    }
}
