//! Error types for the taxfix-core library.

use thiserror::Error;

/// Main error type for the taxfix library.
#[derive(Error, Debug)]
pub enum TaxfixError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Reconciliation could not run on the parsed amounts.
    #[error("reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// External service returned something we could not use.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to local PDF text extraction.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Reasons a document's amounts cannot be reconciled.
///
/// These are per-document conditions: a batch skips the document and
/// moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Fewer dollar amounts than the invoice layout requires.
    #[error("insufficient data: found {found} dollar amounts, need at least {required}")]
    InsufficientData { found: usize, required: usize },

    /// An amount too large for the tax arithmetic.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(rust_decimal::Decimal),
}

/// Errors decoding responses from the extraction/merge services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Response body was not the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Job finished in a failed state.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// Response lacked a field we need.
    #[error("missing field in response: {0}")]
    MissingField(String),
}

/// Result type for the taxfix library.
pub type Result<T> = std::result::Result<T, TaxfixError>;
