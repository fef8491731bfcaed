//! Core library for sales-tax reconciliation of PDF invoices.
//!
//! This crate provides:
//! - Dollar amount extraction from extracted invoice text
//! - Tax reconciliation (detecting tax baked into line-item prices)
//! - Line-item re-pricing and merge payloads for regenerated invoices
//! - Local PDF text extraction and cloud extraction response decoding

pub mod error;
pub mod models;
#[cfg(feature = "native")]
pub mod pdf;
pub mod invoice;
pub mod service;

pub use error::{PdfError, ReconcileError, ServiceError, TaxfixError, Result};
pub use models::config::TaxfixConfig;
pub use models::invoice::{LineItem, PricedItem, TaxAnalysis};
pub use models::merge::{ItemRow, ItemTable, MergePayload};
#[cfg(feature = "native")]
pub use pdf::{analyze_pdf, PdfExtractor, TextExtractor};
pub use invoice::{
    analyze_text, CorrectionPlan, DocumentOutcome, ParsedAmounts, TaxReconciler, Verification,
};
pub use service::structured_text;
