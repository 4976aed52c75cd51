//! Orchestration of the full fetch → extract → parse flow, one circulaire
//! at a time or over whole index ranges.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::fetch::{candidate_filenames, CirculaireFetcher, RemoteSource};
use super::ServiceError;
use crate::config;
use crate::models::circulaire::{
    CirculaireResult, NewCirculaire, RangeOutcome, RangeSummary,
};
use crate::pipeline::aggregate::simplify;
use crate::pipeline::extraction::{
    DocumentExtractor, EmbeddedTextExtractor, OcrConfig, TesseractOcr,
};
use crate::pipeline::parser::parse_circulaire;

/// Documents whose extracted text is shorter than this are considered
/// unreadable (blank scan, wrong file, empty OCR output).
const MIN_DOCUMENT_CHARS: usize = 50;

/// Tuning for the service and its extraction backend.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub head_timeout: Duration,
    pub ocr: OcrConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: config::BASE_URL.to_string(),
            request_timeout: config::DOWNLOAD_TIMEOUT,
            head_timeout: config::HEAD_TIMEOUT,
            ocr: OcrConfig::default(),
        }
    }
}

/// Options for a sequential range run.
#[derive(Debug, Clone)]
pub struct RangeOptions {
    pub start: u32,
    pub end: u32,
    pub years: Vec<String>,
    /// Pause between requests, skipped after the last index of a year.
    pub delay: Duration,
    /// Abort a year after this many consecutive failures; 0 disables.
    pub max_consecutive_failures: u32,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            start: 1,
            end: 99,
            years: vec![config::DEFAULT_YEAR.to_string()],
            delay: Duration::from_secs(1),
            max_consecutive_failures: 0,
        }
    }
}

/// Options for a new-circulaire availability check.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub years: Vec<String>,
    pub max_index: u32,
    /// Stop scanning a year after this many consecutive unknown misses.
    pub max_consecutive_failures: u32,
    pub delay: Duration,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            years: vec![config::DEFAULT_YEAR.to_string()],
            max_index: 99,
            max_consecutive_failures: 20,
            delay: Duration::from_millis(200),
        }
    }
}

/// Downloads circulaire PDFs and runs them through extraction and parsing.
///
/// Per-document problems (missing file, unreadable PDF, short text) are
/// reported inside the returned `CirculaireResult`, never as errors, so
/// range runs always complete.
pub struct CirculaireService<S: RemoteSource = CirculaireFetcher> {
    source: S,
    extractor: Arc<DocumentExtractor>,
    base_url: String,
}

impl CirculaireService {
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let fetcher = CirculaireFetcher::new(config.request_timeout, config.head_timeout);
        let extractor = DocumentExtractor::with_sources(
            Box::new(EmbeddedTextExtractor),
            Box::new(TesseractOcr::new(config.ocr)),
        );
        Self {
            source: fetcher,
            extractor: Arc::new(extractor),
            base_url: config.base_url,
        }
    }
}

impl Default for CirculaireService {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RemoteSource> CirculaireService<S> {
    /// Build a service around a custom document source, keeping the default
    /// base URL. Used by tests to substitute in-memory sources.
    pub fn with_source(source: S, extractor: DocumentExtractor) -> Self {
        Self {
            source,
            extractor: Arc::new(extractor),
            base_url: config::BASE_URL.to_string(),
        }
    }

    /// Extract, parse and regroup one in-memory PDF.
    pub async fn process_bytes(&self, filename: &str, pdf_bytes: Vec<u8>) -> CirculaireResult {
        match self.run_pipeline(filename.to_string(), pdf_bytes).await {
            Ok(result) => result,
            Err(e) => {
                warn!(filename, error = %e, "Circulaire processing failed");
                CirculaireResult::failure(Some(filename.to_string()), e.to_string())
            }
        }
    }

    async fn run_pipeline(
        &self,
        filename: String,
        pdf_bytes: Vec<u8>,
    ) -> Result<CirculaireResult, ServiceError> {
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || {
            let document = extractor.extract_bytes(&pdf_bytes)?;

            let chars = document.text.trim().chars().count();
            if chars < MIN_DOCUMENT_CHARS {
                debug!(filename = %filename, chars, "Extracted text too short to parse");
                return Err(ServiceError::TooShort);
            }

            let mut parsed = parse_circulaire(&document.text, &filename);
            parsed.ocr_used = document.ocr_used;
            let simplified = simplify(&parsed);
            info!(
                filename = %filename,
                medications = parsed.medications.len(),
                sections = parsed.sections_found.len(),
                ocr_used = parsed.ocr_used,
                "Processed circulaire"
            );

            Ok(CirculaireResult {
                success: true,
                filename: Some(filename),
                parsed: Some(parsed),
                simplified: Some(simplified),
                error: None,
            })
        })
        .await?
    }

    /// Process a PDF already on disk.
    pub async fn process_file(&self, path: &Path) -> CirculaireResult {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match tokio::fs::read(path).await {
            Ok(bytes) => self.process_bytes(&filename, bytes).await,
            Err(e) => CirculaireResult::failure(Some(filename), e.to_string()),
        }
    }

    /// Download a PDF from an explicit URL and process it. The filename
    /// label is the last URL path segment.
    pub async fn process_url(&self, url: &str) -> CirculaireResult {
        let filename = url.rsplit('/').next().unwrap_or(url).to_string();

        match self.source.download(url).await {
            Some(bytes) => self.process_bytes(&filename, bytes).await,
            None => CirculaireResult::failure(Some(filename), "Failed to download PDF"),
        }
    }

    /// Locate and process the circulaire at `index` for a 2-digit `year`,
    /// trying each filename casing the server is known to use.
    pub async fn process_index(&self, year: &str, index: u32) -> CirculaireResult {
        for filename in candidate_filenames(index, year) {
            let url = format!("{}{}", self.base_url, filename);
            if let Some(bytes) = self.source.download(&url).await {
                debug!(filename = %filename, "Found circulaire on server");
                return self.process_bytes(&filename, bytes).await;
            }
        }

        let fallback = format!("circ{index:02}{year}.pdf");
        warn!(filename = %fallback, "File not found on server");
        CirculaireResult::failure(Some(fallback), "File not found on server")
    }

    /// Sequentially process every index in the configured range for each
    /// configured year, pausing between requests.
    pub async fn process_range(&self, options: &RangeOptions) -> RangeOutcome {
        let mut results = Vec::new();

        for year in &options.years {
            let mut consecutive_failures: u32 = 0;

            for index in options.start..=options.end {
                let result = self.process_index(year, index).await;
                let parsed_ok = result.success && result.parsed.is_some();
                results.push(result);

                if parsed_ok {
                    consecutive_failures = 0;
                } else {
                    consecutive_failures += 1;
                    if options.max_consecutive_failures > 0
                        && consecutive_failures >= options.max_consecutive_failures
                    {
                        info!(
                            year = %year,
                            index,
                            consecutive_failures,
                            "Aborting year scan after consecutive failures"
                        );
                        break;
                    }
                }

                if index < options.end {
                    tokio::time::sleep(options.delay).await;
                }
            }
        }

        let mut outcome = RangeOutcome {
            results: Vec::new(),
            parsed: Vec::new(),
            simplified: Vec::new(),
            summary: RangeSummary::default(),
        };

        for result in results {
            outcome.summary.total += 1;
            if result.success {
                outcome.summary.successful += 1;
                if let Some(parsed) = &result.parsed {
                    outcome.summary.total_medications += parsed.medications.len();
                    outcome.parsed.push(parsed.clone());
                }
                if let Some(simplified) = &result.simplified {
                    outcome.simplified.extend(simplified.iter().cloned());
                }
            } else {
                outcome.summary.failed += 1;
            }
            outcome.results.push(result);
        }

        info!(
            total = outcome.summary.total,
            successful = outcome.summary.successful,
            failed = outcome.summary.failed,
            medications = outcome.summary.total_medications,
            "Range processing complete"
        );

        outcome
    }

    /// Probe the server for circulaires that are not in `known_indices`
    /// yet, without downloading them. A year's scan stops after
    /// `max_consecutive_failures` consecutive misses on unknown indices;
    /// hitting a known index resets the counter.
    pub async fn check_for_new(
        &self,
        known_indices: &[u32],
        options: &CheckOptions,
    ) -> Vec<NewCirculaire> {
        let mut found = Vec::new();

        for year in &options.years {
            let mut consecutive_misses: u32 = 0;

            for index in 1..=options.max_index {
                if known_indices.contains(&index) {
                    consecutive_misses = 0;
                    continue;
                }

                let mut hit = None;
                for filename in candidate_filenames(index, year) {
                    let url = format!("{}{}", self.base_url, filename);
                    if self.source.exists(&url).await {
                        hit = Some(NewCirculaire {
                            year: year.clone(),
                            index,
                            filename,
                            url,
                        });
                        break;
                    }
                }

                match hit {
                    Some(new_circulaire) => {
                        info!(index, year = %year, "New circulaire available");
                        found.push(new_circulaire);
                        consecutive_misses = 0;
                    }
                    None => {
                        consecutive_misses += 1;
                        if consecutive_misses >= options.max_consecutive_failures {
                            debug!(
                                year = %year,
                                index,
                                "Stopping new-circulaire scan"
                            );
                            break;
                        }
                    }
                }

                tokio::time::sleep(options.delay).await;
            }
        }

        info!(count = found.len(), "New-circulaire check complete");
        found
    }
}
