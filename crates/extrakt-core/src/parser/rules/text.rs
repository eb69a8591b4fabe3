//! Text clean-up for notes and security names.

use super::patterns::MULTIPLE_BLANKS;

/// Trim surrounding whitespace.
pub fn trim(text: &str) -> String {
    text.trim().to_string()
}

/// Collapse runs of whitespace into a single blank and trim.
pub fn replace_multiple_blanks(text: &str) -> String {
    MULTIPLE_BLANKS.replace_all(text, " ").trim().to_string()
}
