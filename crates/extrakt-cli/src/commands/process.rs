//! Process command - extract transactions from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use extrakt_core::{Diagnostic, Severity};

use super::{build_extractor, format_result, load_config, load_document, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (.txt or .pdf)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Only use this bundled institution
    #[arg(long)]
    institution: Option<String>,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let extractor = build_extractor(&config, args.institution.as_deref())?;
    let document = load_document(&args.input, &config.input)?;
    debug!("Loaded {} lines", document.len());

    let result = extractor.extract(&document);

    for diagnostic in &result.diagnostics {
        print_diagnostic(diagnostic);
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Print a diagnostic to stderr, coloured by severity.
pub fn print_diagnostic(diagnostic: &Diagnostic) {
    let marker = match diagnostic.severity {
        Severity::Info => style("ℹ").blue(),
        Severity::Warning => style("!").yellow(),
        Severity::Error => style("✗").red(),
    };
    eprintln!("{} {}", marker, diagnostic);
}
