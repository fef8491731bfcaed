//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use std::borrow::Cow;
use tracing::debug;

use super::{Result, TextExtractor};
use crate::error::PdfError;

/// Text-layer extractor for PDFs that carry embedded text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self
    }

    /// Load the document and return bytes pdf-extract can read.
    ///
    /// PDFs encrypted with an empty user password are decrypted and
    /// re-serialized; anything else encrypted is rejected.
    fn readable_bytes<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }
        debug!("PDF has {} pages", page_count);

        if !doc.is_encrypted() {
            return Ok(Cow::Borrowed(data));
        }

        if doc.decrypt("").is_err() {
            return Err(PdfError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
        Ok(Cow::Owned(decrypted))
    }
}

impl TextExtractor for PdfExtractor {
    fn extract_text(&self, data: &[u8]) -> Result<String> {
        let bytes = self.readable_bytes(data)?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        debug!("Extracted {} chars of text", text.len());
        Ok(text)
    }
}
