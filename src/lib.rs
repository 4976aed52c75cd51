//! Parsing of Tunisian PCT medication-price circulaires.
//!
//! A circulaire is a bilingual (Arabic/French) PDF bulletin announcing
//! medication price changes. This crate extracts the text (embedded layer
//! or OCR), locates the category sections, parses the medication price
//! lines, and regroups the results per laboratory. A small service layer
//! fetches circulaires from the PCT server and a SQLite store keeps the
//! parsed results.

pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod service;

pub use models::circulaire::{
    CirculaireResult, NewCirculaire, ParsedCirculaire, RangeOutcome, SimplifiedEntry,
};
pub use models::medication::Medication;
pub use pipeline::extraction::DocumentExtractor;
pub use service::{CheckOptions, CirculaireService, RangeOptions, ServiceConfig};

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber, honoring `RUST_LOG` when set.
/// Call once from a binary or test harness; the library never does.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
