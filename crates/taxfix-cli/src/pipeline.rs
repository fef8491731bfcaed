//! Per-document pipeline shared by the commands: extract, analyze, regenerate.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use indicatif::ProgressBar;
use tracing::{debug, info};

use taxfix_core::models::config::{ExtractionBackend, OutputPaths, TaxfixConfig};
use taxfix_core::pdf::{PdfExtractor, TextExtractor};
use taxfix_core::{analyze_text, DocumentOutcome, MergePayload};

use crate::commands::config::default_config_path;
use crate::services::PdfServicesClient;

/// Load the config from `--config`, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<TaxfixConfig> {
    if let Some(path) = config_path {
        return Ok(TaxfixConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        return Ok(TaxfixConfig::from_file(&default_path)?);
    }

    Ok(TaxfixConfig::default())
}

/// Backend chosen by `--local`, falling back to the config.
pub fn backend(local: bool, config: &TaxfixConfig) -> ExtractionBackend {
    if local {
        ExtractionBackend::Local
    } else {
        config.extraction.backend
    }
}

/// Extract the text of a PDF invoice.
pub async fn extract_text(
    path: &Path,
    config: &TaxfixConfig,
    backend: ExtractionBackend,
    pb: &ProgressBar,
) -> anyhow::Result<String> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    let data = fs::read(path)?;

    let text = match backend {
        ExtractionBackend::Local => {
            pb.set_message("Extracting text locally...");
            PdfExtractor::new().extract_text(&data)?
        }
        ExtractionBackend::Service => {
            pb.set_message("Extracting text with the extraction service...");
            PdfServicesClient::from_config(&config.services)?
                .extract_text(data)
                .await?
        }
    };

    if text.trim().is_empty() {
        anyhow::bail!("No text could be extracted from {}", path.display());
    }

    debug!("Extracted text from {}: {}", path.display(), text);
    Ok(text)
}

/// What happened to one document in `fix`/`batch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStatus {
    /// Regenerated through the merge service.
    Fixed,
    /// Needs fixing; payload prepared but nothing generated.
    DryRun,
    /// Tax already separated.
    Correct,
    /// Too few amounts to reconcile.
    Skipped,
}

impl FixStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::DryRun => "needs_fixing",
            Self::Correct => "correct",
            Self::Skipped => "skipped",
        }
    }
}

/// Result of running `fix` over one document.
#[derive(Debug, Clone)]
pub struct FixReport {
    pub path: PathBuf,
    pub status: FixStatus,
    pub outcome: DocumentOutcome,
    pub output: Option<OutputPaths>,
}

/// Options for [`fix_document`].
#[derive(Debug, Clone, Copy)]
pub struct FixOptions {
    pub backend: ExtractionBackend,
    pub dry_run: bool,
    pub date: NaiveDate,
}

/// Analyze one invoice and regenerate it if its tax is hidden.
pub async fn fix_document(
    path: &Path,
    config: &TaxfixConfig,
    options: FixOptions,
    pb: &ProgressBar,
) -> anyhow::Result<FixReport> {
    let text = extract_text(path, config, options.backend, pb).await?;

    pb.set_message("Reconciling tax...");
    let outcome = analyze_text(&text, config.tax.rate);

    let plan = match &outcome {
        DocumentOutcome::Skipped(_) => {
            return Ok(report(path, FixStatus::Skipped, outcome, None));
        }
        DocumentOutcome::Correct(_) => {
            return Ok(report(path, FixStatus::Correct, outcome, None));
        }
        DocumentOutcome::NeedsFixing(plan) => plan,
    };

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");
    let paths = OutputPaths::for_document(&config.paths, stem, options.date);
    let payload = plan.payload();

    if config.paths.save_payload {
        write_payload(&paths.payload, &payload)?;
    }

    if options.dry_run {
        return Ok(report(path, FixStatus::DryRun, outcome, Some(paths)));
    }

    pb.set_message("Generating corrected invoice...");
    let template = fs::read(&config.paths.template).with_context(|| {
        format!("Failed to read template {}", config.paths.template.display())
    })?;

    let bytes = PdfServicesClient::from_config(&config.services)?
        .generate(template, &payload, &paths.invoice, pb)
        .await?;
    info!("Wrote {} bytes to {}", bytes, paths.invoice.display());

    Ok(report(path, FixStatus::Fixed, outcome, Some(paths)))
}

fn report(
    path: &Path,
    status: FixStatus,
    outcome: DocumentOutcome,
    output: Option<OutputPaths>,
) -> FixReport {
    FixReport {
        path: path.to_path_buf(),
        status,
        outcome,
        output,
    }
}

/// Save a merge payload as pretty JSON.
pub fn write_payload(path: &Path, payload: &MergePayload) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(payload)?)?;
    debug!("Saved merge payload to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_override() {
        let config = TaxfixConfig::default();
        assert_eq!(backend(true, &config), ExtractionBackend::Local);
        assert_eq!(backend(false, &config), ExtractionBackend::Service);
    }

    #[test]
    fn test_write_payload_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("json").join("inv-template-1-10-25.json");
        let payload = MergePayload {
            items: Default::default(),
            subtotal: "400.00".to_string(),
            tax: "35.50".to_string(),
            paid: "435.50".to_string(),
        };

        write_payload(&path, &payload).unwrap();

        let saved: MergePayload = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, payload);
    }
}
