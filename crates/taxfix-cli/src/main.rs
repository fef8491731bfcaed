//! CLI for detecting and correcting sales tax hidden in invoice line items.

mod commands;
mod pipeline;
mod services;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{analyze, batch, config, fix, verify};

/// Invoice tax fixer - find sales tax baked into line items and regenerate invoices
#[derive(Parser)]
#[command(name = "taxfix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single invoice's tax breakdown
    Analyze(analyze::AnalyzeArgs),

    /// Analyze an invoice and regenerate it if tax is hidden
    Fix(fix::FixArgs),

    /// Fix multiple invoice files
    Batch(batch::BatchArgs),

    /// Check the arithmetic of a regenerated invoice
    Verify(verify::VerifyArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Service credentials may live in a local env file
    if dotenvy::from_filename(".env.local").is_ok() {
        tracing::debug!("Loaded environment from .env.local");
    }

    match cli.command {
        Commands::Analyze(args) => analyze::run(args, cli.config.as_deref()).await,
        Commands::Fix(args) => fix::run(args, cli.config.as_deref()).await,
        Commands::Batch(args) => batch::run(args, cli.config.as_deref()).await,
        Commands::Verify(args) => verify::run(args, cli.config.as_deref()).await,
        Commands::Config(args) => config::run(args, cli.config.as_deref()).await,
    }
}
