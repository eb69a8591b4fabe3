//! Common regex patterns for value coercion.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // DD.MM.YYYY (also DD.MM.YY)
    pub static ref DATE_DMY: Regex = Regex::new(
        r"^(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})$"
    ).unwrap();

    // HH:MM:SS or HH:MM
    pub static ref TIME_HMS: Regex = Regex::new(
        r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$"
    ).unwrap();

    // Digits with grouping and decimal separators, nothing else
    pub static ref NUMBER_BODY: Regex = Regex::new(
        r"^\d+(?:\.\d+)?$"
    ).unwrap();

    // Runs of two or more whitespace characters
    pub static ref MULTIPLE_BLANKS: Regex = Regex::new(
        r"\s{2,}"
    ).unwrap();
}
