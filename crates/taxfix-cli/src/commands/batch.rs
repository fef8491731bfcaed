//! Batch command - fix multiple invoice files in turn.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use taxfix_core::models::merge::money;

use super::fix::parse_run_date;
use crate::pipeline::{backend, fix_document, load_config, FixOptions, FixReport, FixStatus};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input PDFs
    #[arg(required = true)]
    input: String,

    /// Write a summary CSV (default path: summary.csv)
    #[arg(long)]
    summary: bool,

    /// Summary CSV path
    #[arg(long, requires = "summary")]
    summary_path: Option<PathBuf>,

    /// Keep going when a file fails
    #[arg(long)]
    continue_on_error: bool,

    /// Build and save payloads but do not call the merge service
    #[arg(long)]
    dry_run: bool,

    /// Extract text locally instead of using the extraction service
    #[arg(long)]
    local: bool,

    /// Run date used in output file names, as m-d-yy (default: today)
    #[arg(long, value_parser = parse_run_date)]
    date: Option<NaiveDate>,
}

/// Result of processing a single file.
struct BatchResult {
    path: PathBuf,
    report: Option<FixReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

impl BatchResult {
    fn status(&self) -> &'static str {
        match &self.report {
            Some(report) => report.status.as_str(),
            None => "error",
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
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

    let options = FixOptions {
        backend: backend(args.local, &config),
        dry_run: args.dry_run,
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
    };

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );
    // Per-file byte progress is not shown in batch mode
    let file_pb = ProgressBar::hidden();

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        overall_pb.set_message(
            path.file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_string(),
        );

        let result = fix_document(&path, &config, options, &file_pb).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(report) => results.push(BatchResult {
                path,
                report: Some(report),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = format!("{:#}", e);
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(BatchResult {
                        path,
                        report: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing {} failed: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .summary_path
            .unwrap_or_else(|| PathBuf::from("summary.csv"));
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let count = |status: FixStatus| {
        results
            .iter()
            .filter(|r| r.report.as_ref().is_some_and(|rep| rep.status == status))
            .count()
    };
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!("  Fixed:        {}", count(FixStatus::Fixed));
    println!("  Needs fixing: {}", count(FixStatus::DryRun));
    println!("  Correct:      {}", count(FixStatus::Correct));
    println!("  Skipped:      {}", count(FixStatus::Skipped));

    if !failed.is_empty() {
        println!("  {}       {}", style("Failed:").red(), failed.len());
        for result in failed {
            println!(
                "    - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "base_amount",
        "tax_amount",
        "total_amount",
        "tax_rate",
        "output",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let analysis = result.report.as_ref().and_then(|r| r.outcome.analysis());
        let output = result
            .report
            .as_ref()
            .and_then(|r| r.output.as_ref())
            .filter(|_| result.status() == FixStatus::Fixed.as_str())
            .map(|paths| paths.invoice.display().to_string())
            .unwrap_or_default();
        let error = match (&result.error, &result.report) {
            (Some(e), _) => e.clone(),
            (None, Some(report)) => match &report.outcome {
                taxfix_core::DocumentOutcome::Skipped(e) => e.to_string(),
                _ => String::new(),
            },
            (None, None) => String::new(),
        };

        wtr.write_record([
            filename,
            result.status(),
            &analysis.map(|a| money(a.base_amount)).unwrap_or_default(),
            &analysis.map(|a| money(a.tax_amount)).unwrap_or_default(),
            &analysis.map(|a| money(a.total_amount)).unwrap_or_default(),
            &analysis.map(|a| a.tax_rate.round_dp(3).to_string()).unwrap_or_default(),
            &output,
            &result.processing_time_ms.to_string(),
            &error,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
