//! Whole-document parse: locate category sections, walk their bodies line
//! by line, and attribute every row to its section and laboratory.

use tracing::debug;

use crate::models::{Medication, ParsedCirculaire, SectionSummary, Specialty};
use crate::pipeline::lines::{is_laboratory_line, parse_medication_line};
use crate::pipeline::metadata::{extract_circulaire_number, extract_date};
use crate::pipeline::pricing::estimate_public_price;
use crate::pipeline::sections::{find_category_sections, find_section_breaks, SectionKey};

/// Parse normalized circulaire text into a structured document.
///
/// A section's body runs from the end of its heading to the start of the
/// next heading, cut short by the first section break in between.
/// Veterinary sections still bound their neighbours but contribute no
/// medications.
pub fn parse_circulaire(text: &str, filename: &str) -> ParsedCirculaire {
    let mut parsed = ParsedCirculaire {
        filename: filename.to_string(),
        date: extract_date(text),
        circulaire_number: extract_circulaire_number(text),
        medications: Vec::new(),
        sections_found: Vec::new(),
        ocr_used: false,
    };

    let sections = find_category_sections(text);
    let breaks = find_section_breaks(text);

    for (i, section) in sections.iter().enumerate() {
        debug!(key = ?section.key, offset = section.start, "category heading matched");
        if section.key.specialty() == Specialty::Veterinary {
            continue;
        }

        let mut section_end = text.len();
        if let Some(next) = sections.get(i + 1) {
            section_end = section_end.min(next.start);
        }
        if let Some(brk) = breaks
            .iter()
            .copied()
            .find(|&b| b > section.end && b < section_end)
        {
            section_end = brk;
        }

        let body = &text[section.end..section_end];
        let medications = parse_section_body(body, section.key);

        parsed.sections_found.push(SectionSummary {
            med_type: section.key.med_type(),
            specialty: section.key.specialty(),
            origin: section.key.origin(),
            medications_count: medications.len(),
        });
        parsed.medications.extend(medications);
    }

    debug!(
        filename,
        sections = parsed.sections_found.len(),
        medications = parsed.medications.len(),
        "parsed circulaire text"
    );
    parsed
}

/// Walk one section body. Laboratory lines update a running laboratory
/// context; consecutive laboratory lines are joined when the earlier one
/// ends in a conjunction or the later one is a short uppercase fragment,
/// since company names often wrap across lines in the tables.
fn parse_section_body(body: &str, key: SectionKey) -> Vec<Medication> {
    let mut medications = Vec::new();
    let mut current_lab: Option<String> = None;
    let mut pending_lab_lines: Vec<String> = Vec::new();

    for raw_line in body.split('\n') {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let cleaned = line.replace('\u{200e}', "").replace('\u{200f}', "");
        let clean_line = cleaned.trim();

        if is_laboratory_line(clean_line) {
            let continues_previous = pending_lab_lines.last().is_some_and(|prev| {
                let prev = prev.trim_end();
                prev.ends_with("AND")
                    || prev.ends_with('&')
                    || (!clean_line.chars().any(char::is_lowercase)
                        && clean_line.split_whitespace().count() <= 3)
            });
            if continues_previous {
                pending_lab_lines.push(clean_line.to_string());
            } else {
                if !pending_lab_lines.is_empty() {
                    current_lab = Some(pending_lab_lines.join(" "));
                }
                pending_lab_lines = vec![clean_line.to_string()];
            }
            continue;
        }

        if !pending_lab_lines.is_empty() {
            current_lab = Some(pending_lab_lines.join(" "));
            pending_lab_lines.clear();
        }

        if let Some(row) = parse_medication_line(line) {
            let mut price_public = row.price_public;
            let mut price_public_calculated = false;
            if price_public.is_none() && row.price_pharmacy > 0.0 {
                price_public = Some(estimate_public_price(row.price_pharmacy));
                price_public_calculated = true;
            }
            medications.push(Medication {
                code: row.code,
                name: row.name,
                laboratory: current_lab.clone(),
                price_wholesale: row.price_wholesale,
                price_pharmacy: row.price_pharmacy,
                price_public,
                price_public_calculated,
                category: row.category,
                margin: row.margin,
                med_type: key.med_type(),
                specialty: key.specialty(),
                origin: key.origin(),
            });
        }
    }

    medications
}
