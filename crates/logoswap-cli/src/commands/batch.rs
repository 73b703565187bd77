//! Batch command - replace logos in many PDFs.
//!
//! Each `<name>.pdf` is paired with `<name>.detections.json` in the same
//! directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use logoswap_core::{
    parse_detections_with_default_size, LogoReplacer, ReplacementReport, ReplacementSet,
};

use super::config::load_config;
use super::replace::{logo_size, LogoSource, ReplaceOptions};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern (e.g. "scans/*.pdf")
    #[arg(required = true)]
    input: String,

    #[command(flatten)]
    logo: LogoSource,

    /// Output directory
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    options: ReplaceOptions,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    report: Option<ReplacementReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.options.apply(&mut config);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let images = ReplacementSet::single(args.logo.load()?);
    let replacer = LogoReplacer::new(config);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let result = process_single_file(&path, &args.output_dir, &replacer, &images);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(report) => results.push(FileResult {
                path,
                report: Some(report),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        report: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args.output_dir.join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let replaced: usize = results
        .iter()
        .filter_map(|r| r.report.as_ref())
        .map(|report| report.applied.len())
        .sum();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} logos replaced",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red(),
        replaced
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

/// Detections file paired with a PDF.
fn detections_path(pdf: &Path) -> PathBuf {
    let stem = pdf.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    pdf.with_file_name(format!("{}.detections.json", stem))
}

fn process_single_file(
    path: &Path,
    output_dir: &Path,
    replacer: &LogoReplacer,
    images: &ReplacementSet,
) -> anyhow::Result<ReplacementReport> {
    let detections_file = detections_path(path);
    if !detections_file.exists() {
        anyhow::bail!("Detections file not found: {}", detections_file.display());
    }

    let pdf = fs::read(path)?;
    let detections = parse_detections_with_default_size(
        &fs::read_to_string(&detections_file)?,
        logo_size(images),
    )?;
    let output = replacer.replace(&pdf, &detections, images)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?;
    let output_path = output_dir.join(file_name);
    fs::write(&output_path, &output.pdf)?;
    debug!("Wrote output to {}", output_path.display());

    Ok(output.report)
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "pages",
        "replaced",
        "skipped",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(report) = &result.report {
            wtr.write_record([
                filename,
                "success",
                &report.page_count.to_string(),
                &report.applied.len().to_string(),
                &report.skipped.len().to_string(),
                &report.warnings.len().to_string(),
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
