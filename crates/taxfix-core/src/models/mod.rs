//! Data models for invoices, tax analysis, and configuration.

pub mod config;
pub mod invoice;
pub mod merge;
