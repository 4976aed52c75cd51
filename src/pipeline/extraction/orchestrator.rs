use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use super::ocr::TesseractOcr;
use super::pdf::EmbeddedTextExtractor;
use super::types::{ExtractedDocument, OcrEngine, PdfExtractor};
use super::ExtractionError;
use crate::pipeline::normalize::{count_arabic_letters, normalize_arabic};

/// Per-page decision thresholds: below either one the embedded text layer
/// is considered junk and the page goes to OCR.
const MIN_PAGE_CHARS: usize = 5;
const MIN_PAGE_ARABIC_LETTERS: usize = 3;

/// Drives extraction for a whole document.
/// Uses trait objects for OCR and PDF extraction, enabling dependency injection.
pub struct DocumentExtractor {
    pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
    ocr_engine: Box<dyn OcrEngine + Send + Sync>,
}

impl DocumentExtractor {
    pub fn new() -> Self {
        Self {
            pdf_extractor: Box::new(EmbeddedTextExtractor),
            ocr_engine: Box::new(TesseractOcr::default()),
        }
    }

    pub fn with_sources(
        pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
        ocr_engine: Box<dyn OcrEngine + Send + Sync>,
    ) -> Self {
        Self {
            pdf_extractor,
            ocr_engine,
        }
    }

    /// Extract the full document text from a PDF on disk.
    ///
    /// Pages whose embedded text layer is missing, nearly empty, or
    /// contains almost no Arabic go through OCR instead. A page whose OCR
    /// fails contributes an empty string; the document itself only fails
    /// when the PDF cannot be parsed at all.
    pub fn extract_file(&self, pdf_path: &Path) -> Result<ExtractedDocument, ExtractionError> {
        let pdf_bytes = std::fs::read(pdf_path)?;
        let pages = self.pdf_extractor.extract_pages(&pdf_bytes)?;
        let page_count = pages.len();

        let mut text = String::new();
        let mut ocr_used = false;

        for (i, page) in pages.iter().enumerate() {
            let page_number = i + 1;
            let non_whitespace = page.text.chars().filter(|c| !c.is_whitespace()).count();
            let arabic_letters = count_arabic_letters(&page.text);
            let needs_ocr = !page.has_embedded_text
                || non_whitespace < MIN_PAGE_CHARS
                || arabic_letters < MIN_PAGE_ARABIC_LETTERS;

            let page_text = if needs_ocr {
                let recognized = self.recognize_page(pdf_path, page_number);
                if !recognized.is_empty() {
                    ocr_used = true;
                }
                normalize_arabic(&recognized)
            } else {
                normalize_arabic(&page.text)
            };

            text.push_str(&page_text);
            text.push('\n');
        }

        debug!(pages = page_count, ocr_used, "extracted document text");
        Ok(ExtractedDocument {
            text,
            ocr_used,
            page_count,
        })
    }

    /// Extract from in-memory PDF bytes. The OCR path renders pages from a
    /// file, so the bytes are staged in a temporary file first.
    pub fn extract_bytes(&self, pdf_bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
        let mut staged = tempfile::NamedTempFile::new()?;
        staged.write_all(pdf_bytes)?;
        staged.flush()?;
        self.extract_file(staged.path())
    }

    fn recognize_page(&self, pdf_path: &Path, page_number: usize) -> String {
        if !self.ocr_engine.is_available() {
            warn!(page = page_number, "OCR tools unavailable, page text lost");
            return String::new();
        }
        match self.ocr_engine.ocr_page(pdf_path, page_number) {
            Ok(text) => text,
            Err(e) => {
                warn!(page = page_number, error = %e, "OCR failed, page text lost");
                String::new()
            }
        }
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::super::types::PageText;
    use super::*;

    struct StubPdf {
        pages: Vec<PageText>,
    }

    impl StubPdf {
        fn with_texts(texts: &[&str]) -> Self {
            Self {
                pages: texts
                    .iter()
                    .map(|t| PageText {
                        text: t.to_string(),
                        has_embedded_text: !t.trim().is_empty(),
                    })
                    .collect(),
            }
        }
    }

    impl PdfExtractor for StubPdf {
        fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
            Ok(self.pages.clone())
        }
    }

    struct StubOcr {
        text: &'static str,
        available: bool,
        fail: bool,
        calls: Arc<Mutex<Vec<usize>>>,
    }

    impl StubOcr {
        fn new(text: &'static str) -> (Self, Arc<Mutex<Vec<usize>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    text,
                    available: true,
                    fail: false,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl OcrEngine for StubOcr {
        fn ocr_page(
            &self,
            _pdf_path: &Path,
            page_number: usize,
        ) -> Result<String, ExtractionError> {
            self.calls.lock().unwrap().push(page_number);
            if self.fail {
                return Err(ExtractionError::OcrProcessing("stub failure".into()));
            }
            Ok(self.text.to_string())
        }

        fn is_available(&self) -> bool {
            self.available
        }
    }

    fn extractor(pdf: StubPdf, ocr: StubOcr) -> DocumentExtractor {
        DocumentExtractor::with_sources(Box::new(pdf), Box::new(ocr))
    }

    #[test]
    fn arabic_rich_pages_skip_ocr() {
        let pdf = StubPdf::with_texts(&["نشرة الأسعار الجديدة للأدوية"]);
        let (ocr, calls) = StubOcr::new("unused");
        let doc = extractor(pdf, ocr).extract_bytes(b"%PDF").unwrap();

        assert!(!doc.ocr_used);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(doc.text, "نشرة الأسعار الجديدة للأدوية\n");
    }

    #[test]
    fn sparse_page_goes_to_ocr() {
        let pdf = StubPdf::with_texts(&["  x  "]);
        let (ocr, calls) = StubOcr::new("نص مستخرج بالتعرف الضوئي");
        let doc = extractor(pdf, ocr).extract_bytes(b"%PDF").unwrap();

        assert!(doc.ocr_used);
        assert_eq!(calls.lock().unwrap().as_slice(), &[1]);
        assert_eq!(doc.text, "نص مستخرج بالتعرف الضوئي\n");
    }

    #[test]
    fn latin_only_page_goes_to_ocr() {
        // long enough, but scanned circulaire pages produce garbage Latin
        let pdf = StubPdf::with_texts(&["INVOICE TOTAL 123.45 END OF PAGE"]);
        let (ocr, calls) = StubOcr::new("المحتوى الحقيقي");
        let doc = extractor(pdf, ocr).extract_bytes(b"%PDF").unwrap();

        assert!(doc.ocr_used);
        assert_eq!(calls.lock().unwrap().as_slice(), &[1]);
        assert_eq!(doc.text, "المحتوى الحقيقي\n");
    }

    #[test]
    fn presentation_forms_count_as_arabic() {
        let pdf = StubPdf::with_texts(&["\u{FEA7}\u{FEAD}\u{FEF4}\u{FEEC} tarif 1,100"]);
        let (ocr, calls) = StubOcr::new("unused");
        let doc = extractor(pdf, ocr).extract_bytes(b"%PDF").unwrap();

        assert!(!doc.ocr_used);
        assert!(calls.lock().unwrap().is_empty());
        // the embedded path still normalizes presentation forms
        assert!(doc.text.contains('\u{062E}'));
    }

    #[test]
    fn missing_text_layer_forces_ocr_even_with_long_text() {
        let pdf = StubPdf {
            pages: vec![PageText {
                text: "نص عربي طويل بما فيه الكفاية للعتبتين".to_string(),
                has_embedded_text: false,
            }],
        };
        let (ocr, calls) = StubOcr::new("نتيجة التعرف");
        let doc = extractor(pdf, ocr).extract_bytes(b"%PDF").unwrap();

        assert!(doc.ocr_used);
        assert_eq!(calls.lock().unwrap().as_slice(), &[1]);
    }

    #[test]
    fn ocr_failure_degrades_to_empty_page() {
        let pdf = StubPdf::with_texts(&["", "نص عربي كامل وصالح للاستعمال"]);
        let (mut ocr, calls) = StubOcr::new("unused");
        ocr.fail = true;
        let doc = extractor(pdf, ocr).extract_bytes(b"%PDF").unwrap();

        assert!(!doc.ocr_used);
        assert_eq!(calls.lock().unwrap().as_slice(), &[1]);
        assert_eq!(doc.text, "\nنص عربي كامل وصالح للاستعمال\n");
        assert_eq!(doc.page_count, 2);
    }

    #[test]
    fn unavailable_ocr_never_runs() {
        let pdf = StubPdf::with_texts(&[""]);
        let (mut ocr, calls) = StubOcr::new("unused");
        ocr.available = false;
        let doc = extractor(pdf, ocr).extract_bytes(b"%PDF").unwrap();

        assert!(!doc.ocr_used);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(doc.text, "\n");
    }

    #[test]
    fn pages_stay_in_order() {
        let pdf = StubPdf::with_texts(&[
            "الصفحة الأولى من النشرة",
            "الصفحة الثانية من النشرة",
        ]);
        let (ocr, _) = StubOcr::new("unused");
        let doc = extractor(pdf, ocr).extract_bytes(b"%PDF").unwrap();

        assert_eq!(
            doc.text,
            "الصفحة الأولى من النشرة\nالصفحة الثانية من النشرة\n"
        );
    }
}
