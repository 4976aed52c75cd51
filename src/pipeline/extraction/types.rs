use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Full-document extraction output: page texts normalized and joined with
/// trailing newlines, in page order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub text: String,
    pub ocr_used: bool,
    pub page_count: usize,
}

/// Raw per-page output of embedded-text extraction.
#[derive(Debug, Clone)]
pub struct PageText {
    pub text: String,
    /// False when the page carries no usable content stream, which forces
    /// the OCR path regardless of text length.
    pub has_embedded_text: bool,
}

/// Embedded-text extraction abstraction (allows mocking for tests)
pub trait PdfExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError>;
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    /// Recognize one page of the PDF at `pdf_path`. Page numbers are
    /// 1-based. Returns raw recognizer output, not yet normalized.
    fn ocr_page(&self, pdf_path: &Path, page_number: usize) -> Result<String, ExtractionError>;

    fn is_available(&self) -> bool;
}
