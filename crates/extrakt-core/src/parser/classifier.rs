//! Document classification and context pre-scan.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::context::Context;
use super::document_type::DocumentType;
use super::institution::Institution;
use crate::document::Document;
use crate::error::ExtractionError;

/// A document type that matched, with its freshly seeded context.
#[derive(Debug)]
pub struct Classification<'a> {
    pub institution: &'a Institution,
    pub document_type: &'a DocumentType,
    pub context: Context,
    /// Set when the pre-scan failed; the blocks of this type are not run.
    pub pre_scan_error: Option<ExtractionError>,
}

/// Find every document type matching `document` and run its pre-scan.
///
/// Each match gets its own context; nothing is shared between types.
pub fn classify<'a>(
    institutions: &'a [Institution],
    document: &'a Document,
    rate_tolerance: Decimal,
) -> Vec<Classification<'a>> {
    let text = document.text();
    let mut classifications = Vec::new();

    for institution in institutions {
        for document_type in institution.classify(text) {
            debug!(
                "{} matches {} / {}",
                document.name(),
                institution.label(),
                document_type.name()
            );

            let mut context = Context::new(institution.number_locale(), rate_tolerance);
            let pre_scan_error = match document_type.pre_scan(document.lines(), &mut context) {
                Ok(()) => None,
                Err(e) => {
                    warn!(
                        "Pre-scan of {} failed for {}: {}",
                        document_type.name(),
                        document.name(),
                        e
                    );
                    Some(e)
                }
            };

            classifications.push(Classification {
                institution,
                document_type,
                context,
                pre_scan_error,
            });
        }
    }

    classifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::DEFAULT_RATE_TOLERANCE;
    use crate::parser::context::{keys, ContextValue};
    use pretty_assertions::assert_eq;

    fn institutions() -> Vec<Institution> {
        vec![
            Institution::new("Bank A")
                .identifier("Bank A AG")
                .add_document_type(DocumentType::new("Kauf").unwrap())
                .add_document_type(
                    DocumentType::new("Kontoauszug").unwrap().with_pre_scan(|lines, ctx| {
                        ctx.put("lines", ContextValue::Decimal(lines.len().into()));
                        Ok(())
                    }),
                ),
            Institution::new("Bank B")
                .identifier("Bank B")
                .add_document_type(DocumentType::new("Kauf").unwrap()),
        ]
    }

    #[test]
    fn test_multiple_types_match_independently() {
        let institutions = institutions();
        let doc = Document::from_lines("a.txt", ["Bank A AG", "Kauf", "Kontoauszug"]);

        let found = classify(&institutions, &doc, DEFAULT_RATE_TOLERANCE);
        let names: Vec<&str> = found.iter().map(|c| c.document_type.name()).collect();
        assert_eq!(names, ["Kauf", "Kontoauszug"]);

        assert!(found[0].context.is_empty());
        assert_eq!(found[1].context.decimal("lines").unwrap(), Decimal::from(3));
    }

    #[test]
    fn test_unknown_document_yields_nothing() {
        let institutions = institutions();
        let doc = Document::from_lines("a.txt", ["Kauf"]);
        assert!(classify(&institutions, &doc, DEFAULT_RATE_TOLERANCE).is_empty());
    }

    #[test]
    fn test_pre_scan_failure_is_recorded() {
        let institutions = vec![Institution::new("C").add_document_type(
            DocumentType::new("Kontoauszug")
                .unwrap()
                .with_pre_scan(|_, ctx| ctx.currency(keys::CURRENCY).map(|_| ())),
        )];
        let doc = Document::from_lines("a.txt", ["Kontoauszug"]);

        let found = classify(&institutions, &doc, DEFAULT_RATE_TOLERANCE);
        assert_eq!(
            found[0].pre_scan_error,
            Some(ExtractionError::MissingContext("currency".to_string()))
        );
    }
}
