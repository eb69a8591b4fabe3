//! Error types for the extrakt-core library.

use thiserror::Error;

/// Main error type for the extrakt library.
#[derive(Error, Debug)]
pub enum ExtraktError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Invalid institution or engine configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transaction extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors raised while building document types, blocks and sections.
///
/// These are programming errors in an institution definition and surface
/// when the definition is constructed, never while a document is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The same capture name is produced by two matchers of one section.
    #[error("capture `{name}` is produced more than once in section [{section}]")]
    DuplicateCapture { section: String, name: String },

    /// A matcher produces a capture the section did not declare.
    #[error("capture `{name}` is not declared by section [{section}]")]
    UndeclaredCapture { section: String, name: String },

    /// A declared attribute is never produced by any matcher.
    #[error("attribute `{name}` of section [{section}] is never captured")]
    UnusedAttribute { section: String, name: String },

    /// A section without any matcher.
    #[error("section [{0}] has no matchers")]
    EmptySection(String),

    /// A block without a transaction builder, or a builder without wrap.
    #[error("block `{0}` has no complete transaction attached")]
    MissingTransaction(String),

    /// An institution name that is not bundled.
    #[error("unknown institution: {0}")]
    UnknownInstitution(String),
}

/// Errors raised while extracting one transaction candidate.
///
/// Every variant is confined to the block instance that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// A required section could not be matched inside the block range.
    #[error("required section [{section}] not found: no line matches `{pattern}`")]
    MissingSection { section: String, pattern: String },

    /// A capture requested by an assignment was not part of the match.
    #[error("missing capture: {0}")]
    MissingCapture(String),

    /// Required field is missing on the finished candidate.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A captured fragment could not be coerced into a typed value.
    #[error("malformed {field} `{value}`: {reason}")]
    MalformedValue {
        field: String,
        value: String,
        reason: String,
    },

    /// A context key was read before anything wrote it.
    #[error("context value `{0}` is not set")]
    MissingContext(String),

    /// A context key holds a value of a different type.
    #[error("context value `{key}` is a {actual}, expected {expected}")]
    ContextType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl ExtractionError {
    /// Build a [`ExtractionError::MalformedValue`].
    pub fn malformed(field: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::MalformedValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Relabel a malformed value with the capture name it came from.
    pub fn with_field(self, name: &str) -> Self {
        match self {
            Self::MalformedValue { value, reason, .. } => Self::MalformedValue {
                field: name.to_string(),
                value,
                reason,
            },
            other => other,
        }
    }

    /// Whether the failure is a data-quality problem rather than a pattern miss.
    pub fn is_data_quality(&self) -> bool {
        matches!(
            self,
            Self::MalformedValue { .. } | Self::MissingContext(_) | Self::ContextType { .. }
        )
    }
}

/// Result type for the extrakt library.
pub type Result<T> = std::result::Result<T, ExtraktError>;
