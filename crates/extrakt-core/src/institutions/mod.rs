//! Bundled institution definitions.

pub mod santander_consumer;

use crate::error::ConfigError;
use crate::parser::Institution;

/// All bundled institutions, in registration order.
pub fn bundled() -> Result<Vec<Institution>, ConfigError> {
    Ok(vec![santander_consumer::institution()?])
}

/// Labels of the bundled institutions.
pub fn labels() -> Vec<&'static str> {
    vec![santander_consumer::LABEL]
}

/// Build one bundled institution by label (case-insensitive).
pub fn by_label(label: &str) -> Result<Institution, ConfigError> {
    if label.eq_ignore_ascii_case(santander_consumer::LABEL) {
        santander_consumer::institution()
    } else {
        Err(ConfigError::UnknownInstitution(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bundled_definitions_are_valid() {
        let institutions = bundled().unwrap();
        let labels_built: Vec<&str> = institutions.iter().map(Institution::label).collect();
        assert_eq!(labels_built, labels());
    }

    #[test]
    fn test_by_label() {
        assert!(by_label("santander consumer bank").is_ok());
        assert!(matches!(
            by_label("Nobank"),
            Err(ConfigError::UnknownInstitution(name)) if name == "Nobank"
        ));
    }
}
