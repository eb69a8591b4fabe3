//! Diagnostics reported next to extracted items.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::money::CurrencyCode;
use crate::error::ExtractionError;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What went wrong (or was merely noticed).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No document type of any institution matched.
    Unclassified,

    /// The document-level pre-scan could not seed the context.
    PreScanFailed { reason: String },

    /// A required section found no line for one of its patterns.
    RequiredSectionMissing { section: String, pattern: String },

    /// The candidate was finished without a mandatory field.
    IncompleteTransaction { field: String },

    /// A capture could not be coerced into a typed value.
    MalformedValue {
        field: String,
        value: String,
        reason: String,
    },

    /// A context value was absent or had the wrong type.
    ContextValue { key: String, reason: String },

    /// The stated exchange rate disagrees with the two gross amounts.
    RateMismatch {
        base: CurrencyCode,
        term: CurrencyCode,
        stated: Decimal,
        computed: Decimal,
    },

    /// The stated exchange rate does not link the two gross currencies.
    RateCurrencyMismatch {
        rate: String,
        gross: CurrencyCode,
        fx_gross: CurrencyCode,
    },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Unclassified => Severity::Info,
            Self::RateMismatch { .. } | Self::RateCurrencyMismatch { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Data-quality problems as opposed to pattern misses.
    pub fn is_data_quality(&self) -> bool {
        matches!(self, Self::MalformedValue { .. } | Self::ContextValue { .. })
    }
}

impl From<ExtractionError> for DiagnosticKind {
    fn from(error: ExtractionError) -> Self {
        match error {
            ExtractionError::MissingSection { section, pattern } => {
                Self::RequiredSectionMissing { section, pattern }
            }
            ExtractionError::MissingCapture(field) | ExtractionError::MissingField(field) => {
                Self::IncompleteTransaction { field }
            }
            ExtractionError::MalformedValue {
                field,
                value,
                reason,
            } => Self::MalformedValue {
                field,
                value,
                reason,
            },
            ExtractionError::MissingContext(key) => Self::ContextValue {
                key,
                reason: "not set".to_string(),
            },
            ExtractionError::ContextType {
                key,
                expected,
                actual,
            } => Self::ContextValue {
                key,
                reason: format!("is a {}, expected {}", actual, expected),
            },
        }
    }
}

/// One diagnostic, naming the document, block and line it concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    /// 1-based line number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(document: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            severity: kind.severity(),
            document: document.into(),
            institution: None,
            document_type: None,
            block: None,
            line: None,
            kind,
        }
    }

    pub fn in_document_type(mut self, institution: &str, document_type: &str) -> Self {
        self.institution = Some(institution.to_string());
        self.document_type = Some(document_type.to_string());
        self
    }

    pub fn at_block(mut self, block: &str, line: usize) -> Self {
        self.block = Some(block.to_string());
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.document)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(document_type) = &self.document_type {
            write!(f, " [{}]", document_type)?;
        }
        if let Some(block) = &self.block {
            write!(f, " block `{}`", block)?;
        }
        write!(f, ": ")?;

        match &self.kind {
            DiagnosticKind::Unclassified => write!(f, "no document type matched"),
            DiagnosticKind::PreScanFailed { reason } => write!(f, "pre-scan failed: {}", reason),
            DiagnosticKind::RequiredSectionMissing { section, pattern } => write!(
                f,
                "required section [{}] not found, no line matches `{}`",
                section, pattern
            ),
            DiagnosticKind::IncompleteTransaction { field } => {
                write!(f, "transaction is missing {}", field)
            }
            DiagnosticKind::MalformedValue {
                field,
                value,
                reason,
            } => write!(f, "malformed {} `{}`: {}", field, value, reason),
            DiagnosticKind::ContextValue { key, reason } => {
                write!(f, "context value `{}`: {}", key, reason)
            }
            DiagnosticKind::RateMismatch {
                base,
                term,
                stated,
                computed,
            } => write!(
                f,
                "stated rate {}/{} {} differs from computed {}",
                base, term, stated, computed
            ),
            DiagnosticKind::RateCurrencyMismatch {
                rate,
                gross,
                fx_gross,
            } => write!(
                f,
                "rate {} does not link {} and {}",
                rate, gross, fx_gross
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_malformed_value_is_data_quality() {
        let kind = DiagnosticKind::from(ExtractionError::malformed("amount", "1,2,3", "two decimal separators"));
        assert!(kind.is_data_quality());
        assert_eq!(kind.severity(), Severity::Error);

        let kind = DiagnosticKind::from(ExtractionError::MissingSection {
            section: "amount, currency".to_string(),
            pattern: "^Ausmachender Betrag.*$".to_string(),
        });
        assert!(!kind.is_data_quality());
    }

    #[test]
    fn test_display_names_document_block_and_line() {
        let diagnostic = Diagnostic::new(
            "statement.txt",
            DiagnosticKind::RequiredSectionMissing {
                section: "date".to_string(),
                pattern: "^Valuta (?<date>.*)$".to_string(),
            },
        )
        .in_document_type("Santander Consumer Bank", "Kontoauszug")
        .at_block("tax", 4);

        assert_eq!(
            diagnostic.to_string(),
            "statement.txt:4 [Kontoauszug] block `tax`: required section [date] not found, no line matches `^Valuta (?<date>.*)$`"
        );
    }

    #[test]
    fn test_serialize_flattens_kind() {
        let diagnostic = Diagnostic::new("doc.txt", DiagnosticKind::Unclassified);
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["kind"], "unclassified");
        assert_eq!(json["severity"], "info");
    }
}
