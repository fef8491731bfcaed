//! Fix command - regenerate an invoice whose tax is hidden in its line items.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use taxfix_core::models::config::parse_date_stamp;
use taxfix_core::DocumentOutcome;

use super::analyze::{display_name, format_outcome, OutputFormat};
use crate::pipeline::{backend, fix_document, load_config, FixOptions, FixReport, FixStatus};

/// Arguments for the fix command.
#[derive(Args)]
pub struct FixArgs {
    /// Input invoice PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Build and save the payload but do not call the merge service
    #[arg(long)]
    dry_run: bool,

    /// Extract text locally instead of using the extraction service
    #[arg(long)]
    local: bool,

    /// Run date used in output file names, as m-d-yy (default: today)
    #[arg(long, value_parser = parse_run_date)]
    date: Option<NaiveDate>,
}

pub(crate) fn parse_run_date(s: &str) -> Result<NaiveDate, String> {
    parse_date_stamp(s).ok_or_else(|| format!("expected a date like 1-7-25, got '{}'", s))
}

pub async fn run(args: FixArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let options = FixOptions {
        backend: backend(args.local, &config),
        dry_run: args.dry_run,
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
    };

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {bytes} {msg}")?
            .progress_chars("##-"),
    );

    let report = fix_document(&args.input, &config, options, &pb).await?;
    pb.finish_and_clear();

    print_report(&report)?;

    debug!("Total fix time: {:?}", start.elapsed());

    Ok(())
}

fn print_report(report: &FixReport) -> anyhow::Result<()> {
    let name = display_name(&report.path);
    println!("{}", format_outcome(&name, &report.outcome, OutputFormat::Text)?);

    match report.status {
        FixStatus::Correct => {
            println!("{} Tax is already shown separately; nothing to fix.", style("✓").green());
        }
        FixStatus::Skipped => {
            println!("{} Not enough amounts to reconcile; skipped.", style("⚠").yellow());
        }
        FixStatus::Fixed | FixStatus::DryRun => {
            if let DocumentOutcome::NeedsFixing(plan) = &report.outcome {
                println!("Changes:");
                for change in plan.changes() {
                    println!("  - {}", change);
                }
            }

            if let Some(paths) = &report.output {
                if paths.payload.exists() {
                    println!(
                        "{} Merge payload saved to {}",
                        style("ℹ").blue(),
                        paths.payload.display()
                    );
                }
                if report.status == FixStatus::Fixed {
                    println!(
                        "{} Corrected invoice written to {}",
                        style("✓").green(),
                        paths.invoice.display()
                    );
                } else {
                    println!(
                        "{} Dry run; {} was not generated",
                        style("ℹ").blue(),
                        paths.invoice.display()
                    );
                }
            }
        }
    }

    Ok(())
}
