//! Rule-based extractors and tax arithmetic for the supported invoice layout.

pub mod amounts;
pub mod line_items;
pub mod patterns;
pub mod tax;

pub use amounts::{
    extract_amounts, format_dollar_amount, parse_dollar_amount, AmountExtractor, ParsedAmounts,
};
pub use line_items::{extract_line_items, LineItemExtractor};
pub use tax::{extract_tax_from_total, round2, strip_tax};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// Extract all occurrences of the field, in text order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value matched in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte span in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
