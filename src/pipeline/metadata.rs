//! Circulaire header metadata: issue date and circulaire number.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

/// Date preceded by the letterhead formula "تونس في" (Tunis, on) or a bare
/// "في". Preferred over an uncontexted date because body text frequently
/// quotes effective dates of older circulaires.
static CONTEXT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:تونس\s*في|في\s*:?)\s*:?\s*(\d{1,2})/(\d{1,2})/(\d{4})").unwrap()
});

static BARE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap());

/// Circulaire number "YYYY/NN" after "رقم" (number) or a colon.
static CIRCULAIRE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:رقم|:)\s*(\d{4})/(\d{1,2})").unwrap());

fn date_from_captures(caps: &Captures) -> Option<NaiveDate> {
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Find the issue date in `DD/MM/YYYY` form, letterhead occurrences first.
/// Matches that do not form a real calendar date are skipped.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    for pattern in [&*CONTEXT_DATE, &*BARE_DATE] {
        for caps in pattern.captures_iter(text) {
            if let Some(date) = date_from_captures(&caps) {
                return Some(date);
            }
        }
    }
    None
}

/// Find the circulaire number, normalized to `YYYY/NN` with a two-digit
/// sequence part.
pub fn extract_circulaire_number(text: &str) -> Option<String> {
    let caps = CIRCULAIRE_NUMBER.captures(text)?;
    Some(format!("{}/{:0>2}", &caps[1], &caps[2]))
}
