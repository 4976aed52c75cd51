//! Per-line classification inside a section body.
//!
//! Price-table rows come in several physical layouts depending on how the
//! PDF was produced: digital exports put the 6-digit code first, OCR of
//! RTL-ordered pages pushes it to the end of the line, and bad scans drop
//! it entirely. The parser tries a fixed cascade of shapes, first match
//! wins. A line matching none of them is table furniture and yields
//! nothing.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Category;

/// One medication row as read off a single line, before section attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMedicationLine {
    pub code: Option<String>,
    pub name: String,
    pub price_wholesale: f64,
    pub price_pharmacy: f64,
    pub price_public: Option<f64>,
    pub category: Option<Category>,
    pub margin: Option<f64>,
}

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Code at start (digital PDFs): code, name, three strict prices,
/// optional category, optional margin.
static CODE_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{6})\s+(.+?)\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})\s*([A-C\-])?\s*(\d[,\.]\d{3})?",
    )
    .unwrap()
});

/// Code at end with category and margin, tolerating stray OCR brackets and
/// a spurious 0/1 glued onto the margin.
static CODE_END_FULL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.+?)\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})[\]\s]*([A-C])[_\s]*[\{\[]?[01]?(\d[,\.]\d{3})[\}\]]?\s*(\d{6})\s*$",
    )
    .unwrap()
});

/// Code at end, category printed as a literal dash.
static CODE_END_DASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.+?)\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})[\]\s]*-\s*(\d{6})\s*$",
    )
    .unwrap()
});

/// Code at end, no category or margin at all.
static CODE_END_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.+?)\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})[\]\s]+(\d{6})\s*$",
    )
    .unwrap()
});

/// Looser code-at-start fallback for malformed spacing; category and margin
/// are recovered by separate probes afterwards.
static CODE_FIRST_LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{6})\s+(.+?)\s+(\d+[,\.]\d+)\s+(\d+[,\.]\d+)\s+(\d+[,\.]\d+)").unwrap()
});

static TRAILING_CATEGORY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s([A-C])\s").unwrap());

static TRAILING_MARGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[,\.]\d{3})\s*$").unwrap());

/// Code at end after two loose prices and arbitrary filler.
static CODE_END_LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z].+?)\s+(\d+[,\.]\d+)\s+(\d+[,\.]\d+)\s+.*?(\d{6})\s*$").unwrap()
});

/// Code at end after two loose prices with optional category/margin.
static CODE_END_TWO_PRICES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z].+?)\s+(\d+[,\.]\d+)\s+(\d+[,\.]\d+)\s+([A-C\-])?\s*(\d[,\.]\d{3})?\s*(\d{6})\s*$")
        .unwrap()
});

/// No code at all: three strict prices with category and margin. Only
/// accepted when the name carries a dosage token, see [`parse_medication_line`].
static NO_CODE_THREE_PRICES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Z][A-Za-z0-9\s\.\-\(\)/\+µ]+?)\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})\s+([A-C])\s+(\d[,\.]\d{3})\s*$",
    )
    .unwrap()
});

/// No code, two strict prices with category and margin.
static NO_CODE_TWO_PRICES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Z][A-Za-z0-9\s\.\-\(\)/\+µ]+?)\s+(\d{1,3}[,\.]\d{3})\s+(\d{1,3}[,\.]\d{3})\s+([A-C])\s+(\d[,\.]\d{3})\s*$",
    )
    .unwrap()
});

/// Dosage-unit token that must appear in a no-code name for the line to
/// count as a medication.
static DOSAGE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s*(mg|ml|μg|µg|%|Comp|Bt|Fl|Sol|Gel)").unwrap());

static NAME_EDGE_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\[\]]+|[\[\]]+$").unwrap());

/// Tokens that disqualify a line from being a laboratory name. All are
/// anchored at the start of the line.
static LAB_SKIP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(Bt|BT|Fl|FL|Sol|SOL|Comp|COMP|Gel|GEL|Ser|SER|Pde|mg|ml|μg|µg)\b",
        r"^\d",
        r"^[\|\-\.\s]+$",
        r"^(mois|Vie|AMM|EXP)",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

/// Corporate tokens that positively identify a laboratory line.
static LAB_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(PHARMA|PHARM|LAB|S\.?A\.?\.?|LLC|GMBH|LTD|INC|SANTE|HEALTH|SCIENCES?|INDUSTRIES?)\b",
    )
    .unwrap()
});

/// Dosage quantity like "50mg" that keeps an uppercase line from being
/// mistaken for a laboratory.
static DOSAGE_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s*(mg|ml|μg|µg|%)").unwrap());

fn parse_price(s: &str) -> Option<f64> {
    s.replace(',', ".").parse().ok()
}

fn parse_category(s: &str) -> Option<Category> {
    if s == "-" {
        return None;
    }
    s.parse().ok()
}

/// Strip stray OCR brackets from the edges of a name and collapse runs of
/// whitespace.
pub fn clean_medication_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let name = NAME_EDGE_BRACKETS.replace_all(name, "");
    WHITESPACE_RUN.replace_all(&name, " ").trim().to_string()
}

/// Parse one line into a medication row. Returns `None` for table headers,
/// page furniture and anything else matching no known row shape.
pub fn parse_medication_line(line: &str) -> Option<ParsedMedicationLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let cleaned = line
        .replace('\u{200e}', "")
        .replace('\u{200f}', "")
        .replace('|', " ");
    let cleaned = WHITESPACE_RUN.replace_all(&cleaned, " ");
    let line = cleaned.trim();

    if let Some(caps) = CODE_FIRST.captures(line) {
        return Some(ParsedMedicationLine {
            code: Some(caps[1].to_string()),
            name: clean_medication_name(&caps[2]),
            price_wholesale: parse_price(&caps[3])?,
            price_pharmacy: parse_price(&caps[4])?,
            price_public: Some(parse_price(&caps[5])?),
            category: caps.get(6).and_then(|m| parse_category(m.as_str())),
            margin: caps.get(7).and_then(|m| parse_price(m.as_str())),
        });
    }

    if let Some(caps) = CODE_END_FULL.captures(line) {
        return Some(ParsedMedicationLine {
            code: Some(caps[7].to_string()),
            name: clean_medication_name(&caps[1]),
            price_wholesale: parse_price(&caps[2])?,
            price_pharmacy: parse_price(&caps[3])?,
            price_public: Some(parse_price(&caps[4])?),
            category: parse_category(&caps[5]),
            margin: parse_price(&caps[6]),
        });
    }

    if let Some(caps) = CODE_END_DASH.captures(line) {
        return Some(ParsedMedicationLine {
            code: Some(caps[5].to_string()),
            name: clean_medication_name(&caps[1]),
            price_wholesale: parse_price(&caps[2])?,
            price_pharmacy: parse_price(&caps[3])?,
            price_public: Some(parse_price(&caps[4])?),
            category: None,
            margin: None,
        });
    }

    if let Some(caps) = CODE_END_BARE.captures(line) {
        return Some(ParsedMedicationLine {
            code: Some(caps[5].to_string()),
            name: clean_medication_name(&caps[1]),
            price_wholesale: parse_price(&caps[2])?,
            price_pharmacy: parse_price(&caps[3])?,
            price_public: Some(parse_price(&caps[4])?),
            category: None,
            margin: None,
        });
    }

    if let Some(caps) = CODE_FIRST_LOOSE.captures(line) {
        let rest = &line[caps.get(0)?.end()..];
        let category = TRAILING_CATEGORY
            .captures(rest)
            .and_then(|c| parse_category(&c[1]));
        let margin = TRAILING_MARGIN
            .captures(line)
            .and_then(|c| parse_price(&c[1]));
        return Some(ParsedMedicationLine {
            code: Some(caps[1].to_string()),
            name: clean_medication_name(&caps[2]),
            price_wholesale: parse_price(&caps[3])?,
            price_pharmacy: parse_price(&caps[4])?,
            price_public: Some(parse_price(&caps[5])?),
            category,
            margin,
        });
    }

    if let Some(caps) = CODE_END_LOOSE.captures(line) {
        return Some(ParsedMedicationLine {
            code: Some(caps[4].to_string()),
            name: clean_medication_name(&caps[1]),
            price_wholesale: parse_price(&caps[2])?,
            price_pharmacy: parse_price(&caps[3])?,
            price_public: None,
            category: None,
            margin: None,
        });
    }

    if let Some(caps) = CODE_END_TWO_PRICES.captures(line) {
        return Some(ParsedMedicationLine {
            code: Some(caps[6].to_string()),
            name: clean_medication_name(&caps[1]),
            price_wholesale: parse_price(&caps[2])?,
            price_pharmacy: parse_price(&caps[3])?,
            price_public: None,
            category: caps.get(4).and_then(|m| parse_category(m.as_str())),
            margin: caps.get(5).and_then(|m| parse_price(m.as_str())),
        });
    }

    // No-code shapes run on a bracket-stripped copy; a match only counts
    // when the name contains a dosage token, otherwise the next shape gets
    // its turn.
    let bracketless = line.replace(']', "").replace('[', "");

    if let Some(caps) = NO_CODE_THREE_PRICES.captures(&bracketless) {
        if DOSAGE_TOKEN.is_match(&caps[1]) {
            return Some(ParsedMedicationLine {
                code: None,
                name: clean_medication_name(&caps[1]),
                price_wholesale: parse_price(&caps[2])?,
                price_pharmacy: parse_price(&caps[3])?,
                price_public: Some(parse_price(&caps[4])?),
                category: parse_category(&caps[5]),
                margin: parse_price(&caps[6]),
            });
        }
    }

    if let Some(caps) = NO_CODE_TWO_PRICES.captures(&bracketless) {
        if DOSAGE_TOKEN.is_match(&caps[1]) {
            return Some(ParsedMedicationLine {
                code: None,
                name: clean_medication_name(&caps[1]),
                price_wholesale: parse_price(&caps[2])?,
                price_pharmacy: parse_price(&caps[3])?,
                price_public: None,
                category: parse_category(&caps[4]),
                margin: parse_price(&caps[5]),
            });
        }
    }

    None
}

/// Heuristic test for a laboratory-name line.
///
/// Laboratory names are Latin-script company lines between medication rows.
/// The test is deliberately conservative: almost-empty lines, dosage-form
/// fragments, and mostly-Arabic lines are rejected before the positive
/// checks run.
pub fn is_laboratory_line(line: &str) -> bool {
    let cleaned = line.replace('\u{200e}', "").replace('\u{200f}', "");
    let line = cleaned.trim();
    let char_count = line.chars().count();
    if char_count < 4 {
        return false;
    }

    let digit_count = line.chars().filter(|c| c.is_numeric()).count();
    if digit_count > 3 {
        return false;
    }

    let arabic_count = line
        .chars()
        .filter(|c| matches!(c, '\u{0600}'..='\u{06FF}'))
        .count();
    if arabic_count as f64 > char_count as f64 * 0.3 {
        return false;
    }

    for pattern in LAB_SKIP_PATTERNS.iter() {
        if pattern.is_match(line) {
            return false;
        }
    }

    if !line.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    if LAB_KEYWORD.is_match(line) {
        return true;
    }

    let alpha_chars: String = line.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if !alpha_chars.chars().any(|c| c.is_ascii_lowercase())
        && (3..=60).contains(&alpha_chars.len())
        && !DOSAGE_QUANTITY.is_match(line)
    {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_first_row_with_category_and_margin() {
        let line = "301234 DOLIPRANE 1000mg Comp. Bt 8 2,970 3,420 4,158 A 0,738";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code.as_deref(), Some("301234"));
        assert_eq!(med.name, "DOLIPRANE 1000mg Comp. Bt 8");
        assert_eq!(med.price_wholesale, 2.970);
        assert_eq!(med.price_pharmacy, 3.420);
        assert_eq!(med.price_public, Some(4.158));
        assert_eq!(med.category, Some(Category::A));
        assert_eq!(med.margin, Some(0.738));
    }

    #[test]
    fn dash_category_means_none() {
        let line = "301234 PRODUIT X 1,100 1,200 1,300 - 0,553";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.category, None);
        assert_eq!(med.margin, Some(0.553));
    }

    #[test]
    fn dot_decimal_separator_accepted() {
        let line = "301234 SIROP 120 ml Fl 5.500 6.050 7.150 B 1.100";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.price_wholesale, 5.5);
        assert_eq!(med.price_public, Some(7.15));
        assert_eq!(med.category, Some(Category::B));
    }

    #[test]
    fn code_at_end_with_category_and_margin() {
        let line = "DOLIPRANE 500 Comp 2,970 3,420 4,158 A 0,738 301234";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code.as_deref(), Some("301234"));
        assert_eq!(med.name, "DOLIPRANE 500 Comp");
        assert_eq!(med.price_public, Some(4.158));
        assert_eq!(med.category, Some(Category::A));
        assert_eq!(med.margin, Some(0.738));
    }

    #[test]
    fn code_at_end_tolerates_ocr_brackets() {
        let line = "POMMADE X 10g 1,100 1,200 1,300] A_[0,553] 301234";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code.as_deref(), Some("301234"));
        assert_eq!(med.name, "POMMADE X 10g");
        assert_eq!(med.category, Some(Category::A));
        assert_eq!(med.margin, Some(0.553));
    }

    #[test]
    fn code_at_end_with_dash_category() {
        let line = "PRODUIT X 1,100 1,200 1,300 - 301234";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code.as_deref(), Some("301234"));
        assert_eq!(med.category, None);
        assert_eq!(med.margin, None);
    }

    #[test]
    fn code_at_end_without_category() {
        let line = "PRODUIT Y 1,100 1,200 1,300 301234";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code.as_deref(), Some("301234"));
        assert_eq!(med.price_public, Some(1.3));
        assert_eq!(med.category, None);
    }

    #[test]
    fn loose_prices_recover_category_and_margin_by_probe() {
        let line = "301234 SIROP 120 ml 5.50 6.05 7.15 B 1,100";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code.as_deref(), Some("301234"));
        assert_eq!(med.name, "SIROP 120 ml");
        assert_eq!(med.price_pharmacy, 6.05);
        assert_eq!(med.category, Some(Category::B));
        assert_eq!(med.margin, Some(1.1));
    }

    #[test]
    fn two_loose_prices_with_filler_before_trailing_code() {
        let line = "AMOXIL 500 mg GELULES 12.5 15.9 promo 301234";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code.as_deref(), Some("301234"));
        assert_eq!(med.price_wholesale, 12.5);
        assert_eq!(med.price_pharmacy, 15.9);
        assert_eq!(med.price_public, None);
    }

    #[test]
    fn missing_code_accepted_when_name_has_dosage() {
        let line = "DOLIPRANE 500 mg Comp. Bt 16 1,166 1,540 2,100 A 0,334";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code, None);
        assert_eq!(med.name, "DOLIPRANE 500 mg Comp. Bt 16");
        assert_eq!(med.price_public, Some(2.1));
        assert_eq!(med.category, Some(Category::A));
    }

    #[test]
    fn missing_code_two_prices_has_no_public_price() {
        let line = "ASPIRINE 100mg Bt 30 1,166 1,540 B 0,374";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code, None);
        assert_eq!(med.price_public, None);
        assert_eq!(med.category, Some(Category::B));
    }

    #[test]
    fn missing_code_rejected_without_dosage_token() {
        let line = "TOTAL GENERAL 1,166 1,540 2,100 A 0,334";
        assert!(parse_medication_line(line).is_none());
    }

    #[test]
    fn brackets_stripped_for_no_code_rows() {
        let line = "[DOLIPRANE] 500 mg Sol 1,166 1,540 2,100 A 0,334";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code, None);
        assert_eq!(med.name, "DOLIPRANE 500 mg Sol");
    }

    #[test]
    fn pipes_and_bidi_marks_are_cleaned() {
        let line = "\u{200f}301234 | DOLIPRANE | 1,100 | 1,200 | 1,300 | A";
        let med = parse_medication_line(line).unwrap();
        assert_eq!(med.code.as_deref(), Some("301234"));
        assert_eq!(med.name, "DOLIPRANE");
        assert_eq!(med.category, Some(Category::A));
    }

    #[test]
    fn furniture_lines_yield_nothing() {
        assert!(parse_medication_line("").is_none());
        assert!(parse_medication_line("PRIX PUBLIC TND").is_none());
        assert!(parse_medication_line("En vigueur à partir du 15/03/2025").is_none());
    }

    #[test]
    fn name_cleaning_strips_edge_brackets() {
        assert_eq!(clean_medication_name("[[X  Y]]"), "X Y");
        assert_eq!(clean_medication_name(""), "");
    }

    #[test]
    fn lab_line_by_keyword() {
        assert!(is_laboratory_line("SANOFI AVENTIS PHARMA"));
        assert!(is_laboratory_line("MEDIS SANTE"));
    }

    #[test]
    fn lab_line_by_uppercase_heuristic() {
        assert!(is_laboratory_line("LABORATOIRES TERIAK"));
        assert!(is_laboratory_line("OPALIA RECORDATI"));
        assert!(is_laboratory_line("SERVIER"));
    }

    #[test]
    fn lab_line_rejects_dosage_fragments() {
        assert!(!is_laboratory_line("Bt 30 comprimés"));
        assert!(!is_laboratory_line("VITAMINE D 50mg"));
    }

    #[test]
    fn lab_line_rejects_numeric_and_punctuation_lines() {
        assert!(!is_laboratory_line("301234 DOLIPRANE"));
        assert!(!is_laboratory_line("-----"));
        assert!(!is_laboratory_line("AB"));
    }

    #[test]
    fn lab_line_rejects_validity_notes_only_at_start() {
        assert!(!is_laboratory_line("mois de validite restante"));
        // SERVIER contains "vie" but does not start with it
        assert!(is_laboratory_line("SERVIER"));
    }

    #[test]
    fn lab_line_rejects_mostly_arabic_lines() {
        assert!(!is_laboratory_line("اختصاصات بشرية محلية"));
    }
}
