//! Batch processing command for multiple documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use extrakt_core::{ExtractionResult, Severity};

use super::{build_extractor, format_result, is_supported, load_config, load_document, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Only use this bundled institution
    #[arg(long)]
    institution: Option<String>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = Arc::new(build_extractor(&config, args.institution.as_deref())?);
    let input = Arc::new(config.input.clone());
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));

    // Documents are independent; each one runs on the blocking pool.
    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let extractor = Arc::clone(&extractor);
        let input = Arc::clone(&input);
        let pb = overall_pb.clone();

        let task_path = path.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let extraction =
                load_document(&task_path, &input).map(|document| extractor.extract(&document));
            pb.inc(1);
            (extraction, file_start.elapsed().as_millis() as u64)
        });
        handles.push((path, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        // A worker that dies only fails its own file.
        let (extraction, processing_time_ms) = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => (Err(anyhow::anyhow!("worker failed: {}", e)), 0),
        };

        match extraction {
            Ok(extraction) => results.push(ProcessResult {
                path,
                extraction: Some(extraction),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.extraction.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(extraction) = &result.extraction {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_result(extraction, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let items: usize = successful
        .iter()
        .filter_map(|r| r.extraction.as_ref())
        .map(|e| e.items.len())
        .sum();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} items",
        style(successful.len()).green(),
        style(failed.len()).red(),
        items
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "items",
        "errors",
        "warnings",
        "document_types",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        if let Some(extraction) = &result.extraction {
            let count = |severity: Severity| {
                extraction
                    .diagnostics
                    .iter()
                    .filter(|d| d.severity == severity)
                    .count()
                    .to_string()
            };
            let mut document_types: Vec<&str> = extraction
                .items
                .iter()
                .map(|i| i.source().document_type.as_str())
                .collect();
            document_types.dedup();

            let status = if extraction.items.is_empty() { "empty" } else { "success" };

            wtr.write_record([
                filename,
                status,
                &extraction.items.len().to_string(),
                &count(Severity::Error),
                &count(Severity::Warning),
                &document_types.join(";"),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
