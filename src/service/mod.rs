pub mod circulaire;
pub mod fetch;

pub use circulaire::*;
pub use fetch::*;

use thiserror::Error;

use crate::pipeline::extraction::ExtractionError;

/// Errors raised while fetching and processing circulaires. Service
/// operations fold these into `CirculaireResult::failure` so a batch run
/// never aborts on a single bad document.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Failed to extract text from PDF")]
    TooShort,

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
