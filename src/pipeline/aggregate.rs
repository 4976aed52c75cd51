//! Grouped-by-laboratory view of a parsed circulaire, the shape consumed
//! by catalog-matching collaborators.

use crate::models::{MedType, ParsedCirculaire, SimplifiedEntry, SimplifiedMedication};

/// Collapse a parsed document into one entry per laboratory, in order of
/// first appearance. A group containing at least one revised row is marked
/// revised as a whole.
pub fn simplify(parsed: &ParsedCirculaire) -> Vec<SimplifiedEntry> {
    if parsed.medications.is_empty() {
        return Vec::new();
    }

    let circulaire = parsed
        .circulaire_number
        .clone()
        .unwrap_or_else(|| parsed.filename.replace(".json", "").replace(".pdf", ""));

    let mut entries: Vec<SimplifiedEntry> = Vec::new();
    for med in &parsed.medications {
        let lab = med
            .laboratory
            .as_deref()
            .unwrap_or("Unknown")
            .replace('\u{200e}', "")
            .replace('\u{200f}', "");
        let lab = lab.trim();

        let idx = match entries.iter().position(|e| e.laboratory == lab) {
            Some(idx) => idx,
            None => {
                entries.push(SimplifiedEntry {
                    date: parsed.date,
                    circulaire: circulaire.clone(),
                    laboratory: lab.to_string(),
                    med_type: MedType::New,
                    medications: Vec::new(),
                });
                entries.len() - 1
            }
        };

        let entry = &mut entries[idx];
        if med.med_type == MedType::Revised {
            entry.med_type = MedType::Revised;
        }
        entry
            .medications
            .push(SimplifiedMedication::from_medication(med));
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Medication, Origin, Specialty};

    fn med(lab: Option<&str>, med_type: MedType) -> Medication {
        Medication {
            code: Some("301234".into()),
            name: "PRODUIT".into(),
            laboratory: lab.map(Into::into),
            price_wholesale: 1.1,
            price_pharmacy: 1.2,
            price_public: Some(1.3),
            price_public_calculated: false,
            category: None,
            margin: None,
            med_type,
            specialty: Specialty::Human,
            origin: Origin::Local,
        }
    }

    fn doc(medications: Vec<Medication>) -> ParsedCirculaire {
        ParsedCirculaire {
            filename: "circ0125.pdf".into(),
            date: None,
            circulaire_number: Some("2025/01".into()),
            medications,
            sections_found: Vec::new(),
            ocr_used: false,
        }
    }

    #[test]
    fn groups_by_laboratory_in_first_seen_order() {
        let parsed = doc(vec![
            med(Some("SAIPH"), MedType::New),
            med(Some("MEDIS"), MedType::New),
            med(Some("SAIPH"), MedType::New),
        ]);
        let entries = simplify(&parsed);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].laboratory, "SAIPH");
        assert_eq!(entries[0].medications.len(), 2);
        assert_eq!(entries[1].laboratory, "MEDIS");
    }

    #[test]
    fn missing_laboratory_groups_under_unknown() {
        let parsed = doc(vec![med(None, MedType::New)]);
        let entries = simplify(&parsed);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].laboratory, "Unknown");
    }

    #[test]
    fn any_revised_row_marks_the_group_revised() {
        let parsed = doc(vec![
            med(Some("SAIPH"), MedType::New),
            med(Some("SAIPH"), MedType::Revised),
        ]);
        let entries = simplify(&parsed);

        assert_eq!(entries[0].med_type, MedType::Revised);
    }

    #[test]
    fn circulaire_label_falls_back_to_stripped_filename() {
        let mut parsed = doc(vec![med(Some("SAIPH"), MedType::New)]);
        parsed.circulaire_number = None;
        let entries = simplify(&parsed);

        assert_eq!(entries[0].circulaire, "circ0125");
    }

    #[test]
    fn sale_price_mirrors_public_price() {
        let parsed = doc(vec![med(Some("SAIPH"), MedType::New)]);
        let entries = simplify(&parsed);

        assert_eq!(entries[0].medications[0].sale_price, Some(1.3));
        assert_eq!(entries[0].medications[0].wholesale_price, 1.1);
    }

    #[test]
    fn empty_document_simplifies_to_nothing() {
        assert!(simplify(&doc(Vec::new())).is_empty());
    }
}
