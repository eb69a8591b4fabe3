//! Extraction engine: classification, block instances and diagnostics.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use super::classifier::{classify, Classification};
use super::institution::Institution;
use crate::document::Document;
use crate::error::ConfigError;
use crate::institutions;
use crate::models::config::ExtractionConfig;
use crate::models::diagnostic::{Diagnostic, DiagnosticKind, Severity};
use crate::models::transaction::{Item, ItemSource};

/// Items and diagnostics extracted from one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Name of the document.
    pub document: String,
    /// Extracted items, per document type in line order.
    pub items: Vec<Item>,
    /// Everything that was noticed or went wrong.
    pub diagnostics: Vec<Diagnostic>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Diagnostics of at least the given severity.
    pub fn diagnostics_at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity >= severity)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics_at_least(Severity::Error).next().is_some()
    }
}

/// Runs registered institutions over documents.
///
/// Documents are independent; one extractor can be shared across threads.
#[derive(Debug)]
pub struct Extractor {
    institutions: Vec<Institution>,
    config: ExtractionConfig,
}

impl Extractor {
    /// Create an extractor without any institution.
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            institutions: Vec::new(),
            config,
        }
    }

    /// Create an extractor with the bundled institutions enabled by `config`.
    pub fn with_bundled(config: ExtractionConfig) -> Result<Self, ConfigError> {
        let mut extractor = Self::new(config);

        if extractor.config.enabled_institutions.is_empty() {
            for institution in institutions::bundled()? {
                extractor.register(institution);
            }
        } else {
            let enabled = extractor.config.enabled_institutions.clone();
            for label in &enabled {
                extractor.register(institutions::by_label(label)?);
            }
        }

        Ok(extractor)
    }

    pub fn register(&mut self, institution: Institution) {
        debug!(
            "Registered {} with {} document types",
            institution.label(),
            institution.document_types().len()
        );
        self.institutions.push(institution);
    }

    pub fn institutions(&self) -> &[Institution] {
        &self.institutions
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract all items of one document.
    ///
    /// Never fails: every problem is confined to the block instance (or
    /// document type) it occurred in and reported as a diagnostic.
    pub fn extract(&self, document: &Document) -> ExtractionResult {
        let start = Instant::now();
        let mut items = Vec::new();
        let mut diagnostics = Vec::new();

        let classifications = classify(&self.institutions, document, self.config.rate_tolerance);

        if classifications.is_empty() {
            info!("No document type matched {}", document.name());
            if self.config.report_unclassified {
                diagnostics.push(Diagnostic::new(document.name(), DiagnosticKind::Unclassified));
            }
        }

        for classification in classifications {
            let (found, problems) = self.run_document_type(document, classification);
            items.extend(found);
            diagnostics.extend(problems);
        }

        info!(
            "Extracted {} items from {} ({} diagnostics)",
            items.len(),
            document.name(),
            diagnostics.len()
        );

        ExtractionResult {
            document: document.name().to_string(),
            items,
            diagnostics,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Extract several documents in order.
    pub fn extract_all(&self, documents: &[Document]) -> Vec<ExtractionResult> {
        documents.iter().map(|document| self.extract(document)).collect()
    }

    fn run_document_type(
        &self,
        document: &Document,
        classification: Classification<'_>,
    ) -> (Vec<Item>, Vec<Diagnostic>) {
        let Classification {
            institution,
            document_type,
            mut context,
            pre_scan_error,
        } = classification;

        let report = |kind: DiagnosticKind| {
            Diagnostic::new(document.name(), kind)
                .in_document_type(institution.label(), document_type.name())
        };

        let mut items = Vec::new();
        let mut diagnostics = Vec::new();

        if let Some(error) = pre_scan_error {
            diagnostics.push(report(DiagnosticKind::PreScanFailed {
                reason: error.to_string(),
            }));
            return (items, diagnostics);
        }

        let lines = document.lines();
        for block in document_type.blocks() {
            let instances = block.instances(lines);
            debug!(
                "Block `{}` of {} has {} instances",
                block.name(),
                document_type.name(),
                instances.len()
            );

            for range in instances {
                let line = range.first_line_number();

                match block.extract(lines, range, &mut context) {
                    Ok(item) => {
                        for warning in context.take_warnings() {
                            diagnostics.push(report(warning).at_block(block.name(), line));
                        }
                        debug!("Block `{}` at line {} produced {}", block.name(), line, item.kind().label());
                        items.push(item.with_source(ItemSource {
                            document: document.name().to_string(),
                            institution: institution.label().to_string(),
                            document_type: document_type.name().to_string(),
                            block: block.name().to_string(),
                            line,
                        }));
                    }
                    Err(error) => {
                        // Findings of a discarded candidate are dropped with it.
                        context.take_warnings();
                        debug!("Block `{}` at line {} failed: {}", block.name(), line, error);
                        diagnostics.push(report(error.into()).at_block(block.name(), line));
                    }
                }
            }
        }

        items.sort_by_key(|item| item.source().line);
        diagnostics.sort_by_key(|diagnostic| diagnostic.line);
        (items, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::money::CurrencyCode;
    use crate::models::transaction::{Transaction, TransactionKind};
    use crate::parser::context::{keys, Context, ContextValue};
    use crate::parser::{Block, CaptureMap, DocumentType, Section, TransactionBuilder};
    use pretty_assertions::assert_eq;

    const STATEMENT: &str = "Kontoauszug
        Währung EUR
        19.05.2023 Einzahlung 34,00
        31.05.2023 Zinsgutschrift 6,63
        31.05.2023 Kapitalertragsteuer -1,66
        01.06.2023 Einzahlung 1,2,5";

    fn document(text: &str) -> Document {
        Document::from_lines("statement.txt", text.lines().map(str::trim))
    }

    fn statement_block(label: &str, kind: TransactionKind) -> Block {
        let pattern = format!(r"^(?<date>\d{{2}}\.\d{{2}}\.\d{{4}}) {} (?<amount>[\.,\d-]+)$", label);
        let builder = TransactionBuilder::new(move || Transaction::new(kind))
            .section(
                Section::new(["date", "amount"]).matching(&pattern).unwrap(),
                |t: &mut Transaction, v: &CaptureMap, ctx: &mut Context| {
                    t.set_date_time(v.date("date")?, None);
                    t.amount = Some(v.amount("amount", ctx.locale())?.abs());
                    t.currency = Some(ctx.currency(keys::CURRENCY)?);
                    Ok(())
                },
            )
            .unwrap()
            .wrap(Item::new);
        Block::new(&pattern).unwrap().named(label).set(builder).unwrap()
    }

    fn statement_institution(reversed: bool) -> Institution {
        let mut blocks = vec![
            statement_block("Kapitalertragsteuer", TransactionKind::Tax),
            statement_block("Zinsgutschrift", TransactionKind::Interest),
            statement_block("Einzahlung", TransactionKind::Deposit),
        ];
        if reversed {
            blocks.reverse();
        }

        let mut document_type = DocumentType::new("Kontoauszug").unwrap().with_pre_scan(|lines, ctx| {
            for line in lines {
                if let Some(code) = line.strip_prefix("Währung ") {
                    ctx.put(keys::CURRENCY, ContextValue::Currency(code.parse()?));
                }
            }
            Ok(())
        });
        for block in blocks {
            document_type = document_type.add_block(block).unwrap();
        }
        Institution::new("Test Bank").add_document_type(document_type)
    }

    fn extractor(reversed: bool) -> Extractor {
        let mut extractor = Extractor::new(ExtractionConfig::default());
        extractor.register(statement_institution(reversed));
        extractor
    }

    fn summary(result: &ExtractionResult) -> Vec<(TransactionKind, String, usize)> {
        result
            .items
            .iter()
            .map(|i| (i.kind(), i.amount().to_string(), i.source().line))
            .collect()
    }

    #[test]
    fn test_statement_items_independent_of_block_order() {
        let doc = document(STATEMENT);
        let forward = extractor(false).extract(&doc);
        let backward = extractor(true).extract(&doc);

        let expected = vec![
            (TransactionKind::Deposit, "34.00 EUR".to_string(), 3),
            (TransactionKind::Interest, "6.63 EUR".to_string(), 4),
            (TransactionKind::Tax, "1.66 EUR".to_string(), 5),
        ];
        assert_eq!(summary(&forward), expected);
        assert_eq!(summary(&backward), expected);
        assert!(forward.items.iter().all(|i| i.amount().currency == CurrencyCode::EUR));
    }

    #[test]
    fn test_malformed_value_confined_to_its_instance() {
        let result = extractor(false).extract(&document(STATEMENT));

        assert_eq!(result.items.len(), 3);
        assert_eq!(result.diagnostics.len(), 1);

        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.block.as_deref(), Some("Einzahlung"));
        assert_eq!(diagnostic.line, Some(6));
        assert_eq!(diagnostic.document_type.as_deref(), Some("Kontoauszug"));
        assert!(diagnostic.kind.is_data_quality());
        assert!(result.has_errors());
    }

    #[test]
    fn test_items_equal_triggers_minus_failures() {
        let doc = document(STATEMENT);
        let extractor = extractor(false);
        let result = extractor.extract(&doc);

        let document_type = &extractor.institutions()[0].document_types()[0];
        let triggers: usize = document_type
            .blocks()
            .iter()
            .map(|b| b.instances(doc.lines()).len())
            .sum();
        let failures = result.diagnostics_at_least(Severity::Error).count();
        assert_eq!(result.items.len(), triggers - failures);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let doc = document(STATEMENT);
        let extractor = extractor(false);

        let first = extractor.extract(&doc);
        let second = extractor.extract(&doc);
        assert_eq!(
            serde_json::to_value(&first.items).unwrap(),
            serde_json::to_value(&second.items).unwrap()
        );
        assert_eq!(first.diagnostics, second.diagnostics);
    }

    #[test]
    fn test_unclassified_document_is_informational() {
        let result = extractor(false).extract(&document("Rechnung Nr. 1"));
        assert!(result.items.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::Unclassified);
        assert_eq!(result.diagnostics[0].severity, Severity::Info);
        assert!(!result.has_errors());

        let quiet = Extractor::new(ExtractionConfig {
            report_unclassified: false,
            ..ExtractionConfig::default()
        });
        assert!(quiet.extract(&document("Rechnung Nr. 1")).diagnostics.is_empty());
    }

    #[test]
    fn test_pre_scan_failure_skips_document_type() {
        let result = extractor(false).extract(&document("Kontoauszug\nWährung EURO"));
        assert!(result.items.is_empty());
        assert!(matches!(
            result.diagnostics[0].kind,
            DiagnosticKind::PreScanFailed { .. }
        ));
    }

    #[test]
    fn test_required_section_failure_reports_pattern() {
        let builder = TransactionBuilder::new(|| Transaction::new(TransactionKind::Fee))
            .section(
                Section::new(["date"])
                    .matching(r"^Valuta (?<date>.*)$")
                    .unwrap(),
                |t: &mut Transaction, v: &CaptureMap, _: &mut Context| {
                    t.set_date_time(v.date("date")?, None);
                    Ok(())
                },
            )
            .unwrap()
            .wrap(Item::new);
        let block = Block::new("^Entgelt.*$").unwrap().named("fee").set(builder).unwrap();
        let mut extractor = Extractor::new(ExtractionConfig::default());
        extractor.register(
            Institution::new("Test Bank")
                .add_document_type(DocumentType::new("Entgelt").unwrap().add_block(block).unwrap()),
        );

        let result = extractor.extract(&document("Entgelt 5,00\nEntgelt 2,00\nValuta 01.02.2023"));
        assert_eq!(result.items.len(), 0);
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(
            result.diagnostics[0].kind,
            DiagnosticKind::RequiredSectionMissing {
                section: "date".to_string(),
                pattern: r"^Valuta (?<date>.*)$".to_string(),
            }
        );
        assert_eq!(result.diagnostics[0].line, Some(1));
        assert!(!result.diagnostics[0].kind.is_data_quality());
    }

    #[test]
    fn test_with_bundled_rejects_unknown_institution() {
        let config = ExtractionConfig {
            enabled_institutions: vec!["Nobank".to_string()],
            ..ExtractionConfig::default()
        };
        assert!(matches!(
            Extractor::with_bundled(config),
            Err(ConfigError::UnknownInstitution(_))
        ));
        assert_eq!(
            Extractor::with_bundled(ExtractionConfig::default())
                .unwrap()
                .institutions()
                .len(),
            1
        );
    }

    #[test]
    fn test_extractor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extractor>();
    }
}
