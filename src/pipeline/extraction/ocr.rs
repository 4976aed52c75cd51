//! Out-of-process OCR through poppler's `pdftoppm` and the `tesseract` CLI.
//!
//! The engine renders exactly one page to PNG, runs the cleanup pass from
//! [`super::preprocess`], and reads recognized text from tesseract's
//! stdout. Both invocations run under a hard deadline; a page that cannot
//! be recognized in time is reported as a timeout and the caller decides
//! how to degrade.

use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use super::preprocess::prepare_for_ocr;
use super::types::OcrEngine;
use super::ExtractionError;

/// External-tool configuration for [`TesseractOcr`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Render resolution handed to pdftoppm.
    pub dpi: u32,
    /// Tesseract language stack. Circulaires mix Arabic headings with
    /// French product names.
    pub languages: String,
    /// Tesseract page segmentation mode. Mode 6 assumes a uniform block of
    /// text, which fits the price tables.
    pub page_segmentation: String,
    /// Hard deadline per external invocation.
    pub timeout: Duration,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            languages: "ara+fra+eng".to_string(),
            page_segmentation: "6".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// OCR engine shelling out to `pdftoppm` and `tesseract`.
pub struct TesseractOcr {
    config: OcrConfig,
}

impl TesseractOcr {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new(OcrConfig::default())
    }
}

impl OcrEngine for TesseractOcr {
    fn ocr_page(&self, pdf_path: &Path, page_number: usize) -> Result<String, ExtractionError> {
        let tmpdir = tempfile::tempdir()?;
        let prefix = tmpdir.path().join(format!("page_{page_number}"));

        let mut render = Command::new("pdftoppm");
        render
            .arg(pdf_path)
            .arg(&prefix)
            .arg("-png")
            .arg("-r")
            .arg(self.config.dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg("-singlefile");
        let rendered = run_with_timeout(render, self.config.timeout)?;
        if !rendered.status.success() {
            return Err(ExtractionError::OcrProcessing(format!(
                "pdftoppm exited with {}: {}",
                rendered.status,
                String::from_utf8_lossy(&rendered.stderr).trim()
            )));
        }

        let image_path = prefix.with_extension("png");
        if !image_path.exists() {
            // blank or out-of-range page renders nothing
            return Ok(String::new());
        }

        let image_bytes = std::fs::read(&image_path)?;
        match prepare_for_ocr(&image_bytes) {
            Ok(cleaned) => std::fs::write(&image_path, cleaned)?,
            Err(e) => debug!(error = %e, "image cleanup failed, recognizing raw render"),
        }

        let mut recognize = Command::new("tesseract");
        recognize
            .arg(&image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.languages)
            .arg("--psm")
            .arg(&self.config.page_segmentation);
        let recognized = run_with_timeout(recognize, self.config.timeout)?;
        if !recognized.status.success() {
            return Err(ExtractionError::OcrProcessing(format!(
                "tesseract exited with {}: {}",
                recognized.status,
                String::from_utf8_lossy(&recognized.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&recognized.stdout).into_owned())
    }

    fn is_available(&self) -> bool {
        ocr_tools_available()
    }
}

/// Probe for both external tools. A missing binary or exec failure counts
/// as unavailable.
pub fn ocr_tools_available() -> bool {
    let probe = |tool: &str, flag: &str| {
        Command::new(tool)
            .arg(flag)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    };
    probe("pdftoppm", "-v") && probe("tesseract", "--version")
}

/// Run a command to completion with a deadline, killing it on overrun.
fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<Output, ExtractionError> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let deadline = Instant::now() + timeout;

    loop {
        if child.try_wait()?.is_some() {
            return Ok(child.wait_with_output()?);
        }
        if Instant::now() >= deadline {
            child.kill().ok();
            child.wait().ok();
            return Err(ExtractionError::OcrTimeout {
                seconds: timeout.as_secs(),
            });
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}
