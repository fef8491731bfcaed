//! Verify command - check the arithmetic of a regenerated invoice.

use std::path::PathBuf;

use clap::Args;
use console::style;
use indicatif::ProgressBar;
use tracing::info;

use taxfix_core::invoice::rules::{extract_amounts, format_dollar_amount};
use taxfix_core::invoice::{verify_amounts, Verification};
use taxfix_core::models::config::ExtractionBackend;

use crate::pipeline::{extract_text, load_config};

/// Arguments for the verify command.
#[derive(Args)]
pub struct VerifyArgs {
    /// Regenerated invoice PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Print the checks as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: VerifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    info!("Verifying file: {}", args.input.display());

    let pb = ProgressBar::hidden();
    let text = extract_text(&args.input, &config, ExtractionBackend::Local, &pb).await?;
    let verification = verify_amounts(&extract_amounts(&text), config.tax.rate)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&verification)?);
    } else {
        println!("{}", format_verification(&verification, config.tax.rate));
    }

    if !verification.is_valid() {
        anyhow::bail!("{} failed verification", args.input.display());
    }

    Ok(())
}

fn check(ok: bool) -> String {
    if ok {
        style("✓").green().to_string()
    } else {
        style("✗").red().to_string()
    }
}

fn format_verification(v: &Verification, rate: rust_decimal::Decimal) -> String {
    let mut output = String::new();

    output.push_str("Line items:\n");
    for (i, item) in v.line_items.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, format_dollar_amount(*item)));
    }
    output.push('\n');

    output.push_str(&format!(
        "{} Subtotal {} equals the line items\n",
        check(v.subtotal_matches),
        format_dollar_amount(v.subtotal)
    ));
    output.push_str(&format!(
        "{} Tax {} is {:.3}% of the subtotal (expected {:.3}%)\n",
        check(v.rate_matches),
        format_dollar_amount(v.tax),
        v.effective_rate.round_dp(3),
        (rate * rust_decimal::Decimal::ONE_HUNDRED).round_dp(3)
    ));
    output.push_str(&format!(
        "{} Subtotal plus tax equals the amount due {}\n",
        check(v.total_matches),
        format_dollar_amount(v.due)
    ));
    output.push_str(&format!("  Amount paid: {}", format_dollar_amount(v.paid)));

    output
}
