//! PDF to document-lines adapter.

mod extractor;

pub use extractor::{PdfContent, PdfExtractor};

use crate::document::Document;
use crate::error::PdfError;
use crate::models::config::InputConfig;

/// Kind of text content a PDF carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Contains extractable text.
    Text,
    /// Too little text; most likely a scan.
    Scanned,
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;
}

/// Load PDF bytes and split the text into a document.
///
/// Scanned PDFs carry no text layer and are rejected.
pub fn load_document(name: &str, data: &[u8], config: &InputConfig) -> Result<Document> {
    let mut extractor = PdfExtractor::new();
    extractor.load(data)?;

    let content = extractor.extract_all(config.min_text_length)?;
    if content.pdf_type == PdfType::Scanned {
        return Err(PdfError::TextExtraction(format!(
            "only {} characters of text, the document is probably scanned",
            content.text.trim().len()
        )));
    }

    Ok(Document::from_text(name, &content.text, config))
}
