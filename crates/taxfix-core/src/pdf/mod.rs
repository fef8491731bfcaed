//! Local PDF text extraction.

mod extractor;

pub use extractor::PdfExtractor;

use rust_decimal::Decimal;

use crate::error::PdfError;
use crate::invoice::{analyze_text, DocumentOutcome};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Something that turns PDF bytes into plain text.
pub trait TextExtractor {
    /// Extract the text of every page, in reading order.
    fn extract_text(&self, data: &[u8]) -> Result<String>;
}

/// Extract a PDF's text and analyze it in one step.
pub fn analyze_pdf(
    extractor: &impl TextExtractor,
    data: &[u8],
    rate: Decimal,
) -> crate::Result<DocumentOutcome> {
    let text = extractor.extract_text(data)?;
    Ok(analyze_text(&text, rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaxfixError;
    use rust_decimal_macros::dec;

    struct FixedText(&'static str);

    impl TextExtractor for FixedText {
        fn extract_text(&self, _data: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_analyze_pdf_uses_extractor() {
        let extractor = FixedText("$217.75 $217.75 $435.50 $0.00 $435.50");
        let outcome = analyze_pdf(&extractor, b"", dec!(0.08875)).unwrap();
        assert!(matches!(outcome, DocumentOutcome::NeedsFixing(_)));
    }

    #[test]
    fn test_analyze_pdf_propagates_parse_errors() {
        let result = analyze_pdf(&PdfExtractor::new(), b"not a pdf", dec!(0.08875));
        assert!(matches!(result, Err(TaxfixError::Pdf(PdfError::Parse(_)))));
    }
}
