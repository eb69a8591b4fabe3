//! Configuration structures for the extraction pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for extrakt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraktConfig {
    /// Engine configuration.
    pub extraction: ExtractionConfig,

    /// How input text is split into document lines.
    pub input: InputConfig,
}

/// Extraction engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Relative tolerance between a stated exchange rate and the rate implied
    /// by the two gross amounts (0.01 = 1%).
    pub rate_tolerance: Decimal,

    /// Institutions to register; empty means all bundled institutions.
    pub enabled_institutions: Vec<String>,

    /// Emit an informational diagnostic for documents no type matched.
    pub report_unclassified: bool,
}

/// Default relative exchange-rate tolerance (1%).
pub const DEFAULT_RATE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rate_tolerance: DEFAULT_RATE_TOLERANCE,
            enabled_institutions: Vec::new(),
            report_unclassified: true,
        }
    }
}

/// Input handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Strip leading and trailing whitespace from every line.
    pub trim_lines: bool,

    /// Drop lines that are empty after trimming.
    pub skip_blank_lines: bool,

    /// Minimum PDF text length below which the document is reported as
    /// probably scanned.
    pub min_text_length: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            trim_lines: true,
            skip_blank_lines: false,
            min_text_length: 50,
        }
    }
}

impl ExtraktConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
