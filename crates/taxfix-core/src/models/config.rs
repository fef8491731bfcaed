//! Configuration structures for the reconciliation pipeline.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the taxfix pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxfixConfig {
    /// Sales-tax configuration.
    pub tax: TaxConfig,

    /// Template and output locations.
    pub paths: PathConfig,

    /// Cloud extraction/merge service settings.
    pub services: ServiceConfig,

    /// Text extraction settings.
    pub extraction: ExtractionConfig,
}

/// Sales-tax configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    /// Tax rate as a fraction (0.08875 = 8.875%).
    pub rate: Decimal,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            // New York City combined sales tax
            rate: Decimal::new(8875, 5),
        }
    }
}

/// File locations used when regenerating invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Merge template (DOCX) uploaded to the document generation service.
    pub template: PathBuf,

    /// Directory for regenerated PDFs.
    pub output_dir: PathBuf,

    /// Directory for saved merge payloads.
    pub data_dir: PathBuf,

    /// Save the merge payload JSON next to each regenerated invoice.
    pub save_payload: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from("src/docs/template.docx"),
            output_dir: PathBuf::from("output"),
            data_dir: PathBuf::from("data/json"),
            save_payload: true,
        }
    }
}

/// Cloud PDF service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the text extraction service.
    pub extract_url: String,

    /// Base URL of the document generation service.
    pub merge_url: String,

    /// Environment variable holding the bearer token.
    pub api_key_env: String,

    /// Environment variable holding the client id.
    pub client_id_env: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Delay between job status polls.
    pub poll_interval_ms: u64,

    /// Give up on a job after this many polls.
    pub max_polls: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            extract_url: "https://pdf-services.adobe.io".to_string(),
            merge_url: "https://pdf-services.adobe.io".to_string(),
            api_key_env: "PDF_SERVICES_API_KEY".to_string(),
            client_id_env: "PDF_SERVICES_CLIENT_ID".to_string(),
            timeout_secs: 300,
            poll_interval_ms: 2000,
            max_polls: 60,
        }
    }
}

/// Where extracted text comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionBackend {
    /// Local lopdf/pdf-extract text layer.
    Local,
    /// Cloud extraction service.
    #[default]
    Service,
}

/// Text extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extraction backend to use unless overridden on the command line.
    pub backend: ExtractionBackend,
}

/// Output locations for one processed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Regenerated invoice PDF.
    pub invoice: PathBuf,
    /// Saved merge payload.
    pub payload: PathBuf,
}

impl OutputPaths {
    /// Build output paths for a document stem on a given run date.
    pub fn for_document(paths: &PathConfig, stem: &str, date: NaiveDate) -> Self {
        let date = date_stamp(date);
        Self {
            invoice: paths.output_dir.join(format!("{}-{}.pdf", stem, date)),
            payload: paths.data_dir.join(format!("{}-template-{}.json", stem, date)),
        }
    }
}

/// Format a date as `m-d-yy` with unpadded month and day.
pub fn date_stamp(date: NaiveDate) -> String {
    format!("{}-{}-{:02}", date.month(), date.day(), date.year() % 100)
}

/// Parse a `m-d-yy` stamp back into a date.
pub fn parse_date_stamp(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('-');
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || year > 99 {
        return None;
    }
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

impl TaxfixConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
