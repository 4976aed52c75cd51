use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config;

/// Casing variants the PCT server actually uses for circulaire filenames.
const FILENAME_PREFIXES: [&str; 3] = ["circ", "Circ", "CIRC"];

/// Candidate filenames for a circulaire index within a 2-digit year,
/// in the order they should be tried.
pub fn candidate_filenames(index: u32, year: &str) -> Vec<String> {
    FILENAME_PREFIXES
        .iter()
        .map(|prefix| format!("{prefix}{index:02}{year}.pdf"))
        .collect()
}

/// Remote document source. The production implementation talks HTTP to the
/// PCT server; tests substitute an in-memory map.
pub trait RemoteSource: Send + Sync {
    /// Fetch a URL and return the PDF body, or `None` when the server does
    /// not serve a PDF there. Transport errors are misses, not failures.
    fn download(&self, url: &str) -> impl Future<Output = Option<Vec<u8>>> + Send;

    /// Cheap existence probe (HEAD). Errors count as absent.
    fn exists(&self, url: &str) -> impl Future<Output = bool> + Send;
}

/// HTTP fetcher for the PCT document server.
pub struct CirculaireFetcher {
    client: reqwest::Client,
    request_timeout: Duration,
    head_timeout: Duration,
}

impl CirculaireFetcher {
    pub fn new(request_timeout: Duration, head_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            request_timeout,
            head_timeout,
        }
    }
}

impl Default for CirculaireFetcher {
    fn default() -> Self {
        Self::new(config::DOWNLOAD_TIMEOUT, config::HEAD_TIMEOUT)
    }
}

impl RemoteSource for CirculaireFetcher {
    async fn download(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "Download request failed");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!(url, status = %response.status(), "Download miss");
            return None;
        }

        // The server answers some bad filenames with a 200 HTML error page.
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        if !content_type.contains("pdf") {
            debug!(url, content_type, "Response is not a PDF");
            return None;
        }

        match response.bytes().await {
            Ok(body) => Some(body.to_vec()),
            Err(e) => {
                warn!(url, error = %e, "Failed to read PDF body");
                None
            }
        }
    }

    async fn exists(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(self.head_timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(_) => false,
        }
    }
}
