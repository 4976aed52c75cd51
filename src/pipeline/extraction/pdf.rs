use super::types::{PageText, PdfExtractor};
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers.
pub struct EmbeddedTextExtractor;

impl PdfExtractor for EmbeddedTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        let page_texts = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        Ok(page_texts
            .into_iter()
            .map(|text| {
                let has_embedded_text = !text.trim().is_empty();
                PageText {
                    text,
                    has_embedded_text,
                }
            })
            .collect())
    }
}
