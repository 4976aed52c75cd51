pub mod types;
pub mod preprocess;
pub mod pdf;
pub mod ocr;
pub mod orchestrator;

pub use types::*;
pub use preprocess::*;
pub use pdf::*;
pub use ocr::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("OCR timed out after {seconds}s")]
    OcrTimeout { seconds: u64 },
}
