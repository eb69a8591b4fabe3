//! Documents as ordered, immutable line sequences.

use crate::models::config::InputConfig;

/// A converted bank or broker document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    lines: Vec<String>,
    text: String,
}

impl Document {
    /// Create a document from already split lines.
    pub fn from_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let text = lines.join("\n");
        Self {
            name: name.into(),
            lines,
            text,
        }
    }

    /// Split plain text into lines according to the input configuration.
    pub fn from_text(name: impl Into<String>, text: &str, config: &InputConfig) -> Self {
        let lines = text
            .lines()
            .map(|line| if config.trim_lines { line.trim() } else { line })
            .filter(|line| !config.skip_blank_lines || !line.trim().is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        Self::from_lines(name, lines)
    }

    /// Name used in diagnostics (usually the file name).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined by newlines.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Line by 1-based number.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|index| self.lines.get(index))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Half-open range `[start, end)` of 0-based line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// 1-based number of the first line.
    pub fn first_line_number(&self) -> usize {
        self.start + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_text_trims_lines() {
        let doc = Document::from_text("a.txt", "  Kontoauszug \r\n\n Einzahlung  ", &InputConfig::default());
        assert_eq!(doc.lines(), ["Kontoauszug", "", "Einzahlung"]);
        assert_eq!(doc.line(1), Some("Kontoauszug"));
        assert_eq!(doc.line(0), None);
        assert_eq!(doc.text(), "Kontoauszug\n\nEinzahlung");
    }

    #[test]
    fn test_from_text_skips_blank_lines() {
        let config = InputConfig {
            skip_blank_lines: true,
            ..InputConfig::default()
        };
        let doc = Document::from_text("a.txt", "a\n   \nb", &config);
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_line_range() {
        let range = LineRange::new(3, 7);
        assert_eq!(range.len(), 4);
        assert_eq!(range.first_line_number(), 4);
        assert!(LineRange::new(5, 5).is_empty());
    }
}
