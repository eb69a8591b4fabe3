//! Institutions: bank identifiers and the document types they issue.

use super::document_type::DocumentType;
use super::rules::NumberLocale;

/// A bank or broker and its document types.
#[derive(Debug)]
pub struct Institution {
    label: String,
    identifiers: Vec<String>,
    locale: NumberLocale,
    document_types: Vec<DocumentType>,
}

impl Institution {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            identifiers: Vec::new(),
            locale: NumberLocale::default(),
            document_types: Vec::new(),
        }
    }

    /// Literal text identifying documents of this institution.
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifiers.push(identifier.into());
        self
    }

    /// Number format used on this institution's documents.
    pub fn locale(mut self, locale: NumberLocale) -> Self {
        self.locale = locale;
        self
    }

    pub fn add_document_type(mut self, document_type: DocumentType) -> Self {
        self.document_types.push(document_type);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn number_locale(&self) -> NumberLocale {
        self.locale
    }

    pub fn document_types(&self) -> &[DocumentType] {
        &self.document_types
    }

    /// Without identifiers every document qualifies; otherwise one must occur.
    pub fn is_identified(&self, text: &str) -> bool {
        self.identifiers.is_empty() || self.identifiers.iter().any(|id| text.contains(id.as_str()))
    }

    /// Document types of this institution matching `text`, in declaration order.
    pub fn classify<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a DocumentType> + 'a {
        let identified = self.is_identified(text);
        self.document_types
            .iter()
            .filter(move |document_type| identified && document_type.matches(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bank() -> Institution {
        Institution::new("Test Bank")
            .identifier("Test Bank AG")
            .add_document_type(DocumentType::new("Kauf").unwrap())
            .add_document_type(DocumentType::new("Dividende").unwrap())
    }

    #[test]
    fn test_identifier_gates_document_types() {
        let bank = bank();
        assert_eq!(bank.classify("Kauf\nDividende").count(), 0);

        let names: Vec<&str> = bank
            .classify("Test Bank AG\nKauf\nDividende")
            .map(DocumentType::name)
            .collect();
        assert_eq!(names, ["Kauf", "Dividende"]);
    }

    #[test]
    fn test_no_identifiers_accepts_everything() {
        let bank = Institution::new("Any").add_document_type(DocumentType::new("Kauf").unwrap());
        assert!(bank.is_identified("whatever"));
        assert_eq!(bank.classify("Kauf").count(), 1);
    }
}
