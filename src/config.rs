use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "circulex";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Root of the PCT document server where circulaire PDFs are published.
pub const BASE_URL: &str = "http://www.phct.com.tn/images/DocumentsPCT/Circulaires/";

/// Two-digit year suffix used in circulaire filenames when none is given.
pub const DEFAULT_YEAR: &str = "25";

/// Timeout for circulaire PDF downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for HEAD existence probes during new-circulaire checks.
pub const HEAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info")
}

/// Get the application data directory
/// ~/.local/share/circulex (or the platform equivalent)
pub fn app_data_dir() -> PathBuf {
    let base = dirs::data_dir().expect("Cannot determine user data directory");
    base.join(APP_NAME)
}

/// Default path of the SQLite database holding parsed circulaires.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("circulaires.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_under_app_data() {
        let db = default_database_path();
        let app = app_data_dir();
        assert!(db.starts_with(app));
        assert!(db.ends_with("circulaires.db"));
    }

    #[test]
    fn base_url_ends_with_slash() {
        assert!(BASE_URL.ends_with('/'));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn log_filter_names_crate() {
        assert!(default_log_filter().starts_with("circulex"));
    }
}
