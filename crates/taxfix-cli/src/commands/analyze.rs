//! Analyze command - report an invoice's tax breakdown without changing it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use taxfix_core::invoice::rules::format_dollar_amount;
use taxfix_core::models::merge::money;
use taxfix_core::{analyze_text, DocumentOutcome, TaxAnalysis};

use crate::pipeline::{backend, extract_text, load_config};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input invoice PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Extract text locally instead of using the extraction service
    #[arg(long)]
    local: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text breakdown
    Text,
}

/// Serialized form of one analyzed document.
#[derive(Debug, Serialize)]
struct AnalysisReport<'a> {
    file: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a TaxAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    changes: Vec<String>,
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    info!("Analyzing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);

    let text = extract_text(&args.input, &config, backend(args.local, &config), &pb).await?;
    let outcome = analyze_text(&text, config.tax.rate);

    pb.finish_and_clear();

    let name = display_name(&args.input);
    let output = format_outcome(&name, &outcome, args.format)?;

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

    debug!("Total analysis time: {:?}", start.elapsed());

    Ok(())
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice")
        .to_string()
}

pub(crate) fn status(outcome: &DocumentOutcome) -> &'static str {
    match outcome {
        DocumentOutcome::Correct(_) => "correct",
        DocumentOutcome::NeedsFixing(_) => "needs_fixing",
        DocumentOutcome::Skipped(_) => "skipped",
    }
}

fn changes(outcome: &DocumentOutcome) -> Vec<String> {
    match outcome {
        DocumentOutcome::NeedsFixing(plan) => plan.changes(),
        _ => Vec::new(),
    }
}

/// Render an outcome in the requested format.
pub(crate) fn format_outcome(
    name: &str,
    outcome: &DocumentOutcome,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => format_json(name, outcome),
        OutputFormat::Csv => format_csv(name, outcome),
        OutputFormat::Text => Ok(format_text(name, outcome)),
    }
}

fn format_json(name: &str, outcome: &DocumentOutcome) -> anyhow::Result<String> {
    let report = AnalysisReport {
        file: name.to_string(),
        status: status(outcome),
        analysis: outcome.analysis(),
        error: match outcome {
            DocumentOutcome::Skipped(e) => Some(e.to_string()),
            _ => None,
        },
        changes: changes(outcome),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn format_csv(name: &str, outcome: &DocumentOutcome) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "file",
        "status",
        "base_amount",
        "tax_amount",
        "total_amount",
        "tax_rate",
    ])?;

    match outcome.analysis() {
        Some(analysis) => wtr.write_record([
            name,
            status(outcome),
            &money(analysis.base_amount),
            &money(analysis.tax_amount),
            &money(analysis.total_amount),
            &analysis.tax_rate.round_dp(3).to_string(),
        ])?,
        None => wtr.write_record([name, status(outcome), "", "", "", ""])?,
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(name: &str, outcome: &DocumentOutcome) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} Analysis:\n", name));

    let analysis = match outcome {
        DocumentOutcome::Skipped(e) => {
            output.push_str(&format!("Skipped: {}\n", e));
            return output;
        }
        other => match other.analysis() {
            Some(analysis) => analysis,
            None => return output,
        },
    };

    output.push_str("Monthly charges:\n");
    output.push_str(&format!("- Base Amount: {}\n", format_dollar_amount(analysis.monthly_base())));
    output.push_str(&format!("- Tax Amount: {}\n", format_dollar_amount(analysis.monthly_tax())));
    output.push_str(&format!("- Monthly Total: {}\n", format_dollar_amount(analysis.monthly_total())));
    output.push('\n');

    output.push_str("Total for two charges:\n");
    output.push_str(&format!("- Total Base: {}\n", format_dollar_amount(analysis.base_amount)));
    output.push_str(&format!("- Total Tax: {}\n", format_dollar_amount(analysis.tax_amount)));
    output.push_str(&format!("- Total Amount: {}\n", format_dollar_amount(analysis.total_amount)));
    output.push_str(&format!("- Actual Tax Rate: {:.3}%\n", analysis.tax_rate.round_dp(3)));

    if analysis.needs_fixing {
        let tax = format_dollar_amount(analysis.tax_amount);
        output.push('\n');
        output.push_str("The Issue:\n");
        output.push_str(&format!(
            "1. The {} tax is hidden within the two {} charges\n",
            tax,
            format_dollar_amount(analysis.monthly_total())
        ));
        output.push_str(&format!("2. The tax line shows $0.00 when it should show {}\n", tax));
        output.push_str("3. The tax must be extracted from the charges and shown separately\n");
    }

    output
}
