//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod institutions;
pub mod process;

use std::fs;
use std::path::Path;

use extrakt_core::models::config::{ExtraktConfig, InputConfig};
use extrakt_core::{Document, ExtractionResult, Extractor, Item, UnitKind};

/// Output format for extraction results.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Load the config file if given, defaults otherwise.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ExtraktConfig> {
    match config_path {
        Some(path) => Ok(ExtraktConfig::from_file(Path::new(path))?),
        None => Ok(ExtraktConfig::default()),
    }
}

/// Build the extractor, optionally restricted to one institution.
pub fn build_extractor(config: &ExtraktConfig, institution: Option<&str>) -> anyhow::Result<Extractor> {
    let mut extraction = config.extraction.clone();
    if let Some(label) = institution {
        extraction.enabled_institutions = vec![label.to_string()];
    }
    Ok(Extractor::with_bundled(extraction)?)
}

/// Whether the file is a supported input.
pub fn is_supported(path: &Path) -> bool {
    matches!(extension(path).as_str(), "txt" | "pdf")
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Read a `.txt` or `.pdf` file into a document named after the file.
pub fn load_document(path: &Path, input: &InputConfig) -> anyhow::Result<Document> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();

    match extension(path).as_str() {
        "txt" => {
            let text = fs::read_to_string(path)?;
            Ok(Document::from_text(name, &text, input))
        }
        "pdf" => {
            let data = fs::read(path)?;
            Ok(extrakt_core::pdf::load_document(&name, &data, input)?)
        }
        other => anyhow::bail!("Unsupported file format: {}", other),
    }
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(&result.items),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(items: &[Item]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "document",
        "line",
        "institution",
        "document_type",
        "kind",
        "date_time",
        "amount",
        "currency",
        "shares",
        "security",
        "isin",
        "wkn",
        "fees",
        "taxes",
        "gross",
        "fx_gross",
        "exchange_rate",
        "note",
    ])?;

    for item in items {
        let source = item.source();
        let security = item.security();
        let gross = item.gross_unit();

        wtr.write_record([
            source.document.as_str(),
            &source.line.to_string(),
            &source.institution,
            &source.document_type,
            item.kind().label(),
            &item.date_time().format("%Y-%m-%dT%H:%M:%S").to_string(),
            &item.amount().amount.to_string(),
            item.amount().currency.as_str(),
            &item.shares().map(|s| s.to_string()).unwrap_or_default(),
            security.map(|s| s.name.as_str()).unwrap_or(""),
            security.and_then(|s| s.isin.as_deref()).unwrap_or(""),
            security.and_then(|s| s.wkn.as_deref()).unwrap_or(""),
            &item.unit_sum(UnitKind::Fee).to_string(),
            &item.unit_sum(UnitKind::Tax).to_string(),
            &gross.map(|g| g.gross.to_string()).unwrap_or_default(),
            &gross.map(|g| g.fx_gross.to_string()).unwrap_or_default(),
            &gross.map(|g| g.exchange_rate.to_string()).unwrap_or_default(),
            item.note().unwrap_or(""),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document: {}\n", result.document));
    output.push_str(&format!("Items: {}\n", result.items.len()));

    for item in &result.items {
        output.push('\n');
        output.push_str(&format!(
            "{} {} {}\n",
            item.date_time().format("%Y-%m-%d %H:%M:%S"),
            item.kind().label(),
            item.amount()
        ));
        if let Some(security) = item.security() {
            output.push_str(&format!("  Security: {}", security.name));
            if let Some(isin) = &security.isin {
                output.push_str(&format!(" ({})", isin));
            }
            output.push('\n');
        }
        if let Some(shares) = item.shares() {
            output.push_str(&format!("  Shares: {}\n", shares));
        }
        for unit in item.units() {
            let label = match unit.kind {
                UnitKind::Fee => "Fee",
                UnitKind::Tax => "Tax",
                UnitKind::GrossValue => "Gross value",
            };
            output.push_str(&format!("  {}: {}\n", label, unit.amount));
        }
        if let Some(gross) = item.gross_unit() {
            output.push_str(&format!(
                "  Gross: {} = {} at {}\n",
                gross.gross, gross.fx_gross, gross.exchange_rate
            ));
        }
        if let Some(note) = item.note() {
            output.push_str(&format!("  Note: {}\n", note));
        }
        output.push_str(&format!(
            "  Source: {} line {}\n",
            item.source().document_type,
            item.source().line
        ));
    }

    output
}
