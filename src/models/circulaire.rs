use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{MedType, Origin, Specialty};
use super::medication::{Medication, SimplifiedMedication};

/// Per-section tally recorded alongside the parsed medications.
/// Veterinary sections are detected but never summarized here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSummary {
    #[serde(rename = "type")]
    pub med_type: MedType,
    pub specialty: Specialty,
    pub origin: Origin,
    pub medications_count: usize,
}

/// Full parse output for one circulaire document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCirculaire {
    pub filename: String,
    pub date: Option<NaiveDate>,
    pub circulaire_number: Option<String>,
    pub medications: Vec<Medication>,
    pub sections_found: Vec<SectionSummary>,
    /// Whether any page of the source document was read through OCR.
    #[serde(default)]
    pub ocr_used: bool,
}

/// Parsed medications regrouped per laboratory, one entry per lab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedEntry {
    pub date: Option<NaiveDate>,
    pub circulaire: String,
    pub laboratory: String,
    #[serde(rename = "type")]
    pub med_type: MedType,
    pub medications: Vec<SimplifiedMedication>,
}

/// Outcome of processing a single circulaire, whatever the source.
/// Failures are reported in-band rather than as errors so that batch
/// runs can keep going.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CirculaireResult {
    pub success: bool,
    pub filename: Option<String>,
    pub parsed: Option<ParsedCirculaire>,
    pub simplified: Option<Vec<SimplifiedEntry>>,
    pub error: Option<String>,
}

impl CirculaireResult {
    pub fn failure(filename: Option<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            filename,
            parsed: None,
            simplified: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate counters for a range run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_medications: usize,
}

/// Everything a range run produced: per-file results plus the pooled
/// parses and laboratory-grouped entries of the successful ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeOutcome {
    pub results: Vec<CirculaireResult>,
    pub parsed: Vec<ParsedCirculaire>,
    pub simplified: Vec<SimplifiedEntry>,
    pub summary: RangeSummary,
}

/// A circulaire discovered on the server that is not yet known locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCirculaire {
    pub year: String,
    pub index: u32,
    pub filename: String,
    pub url: String,
}

/// Database row for a stored circulaire (medications live in their own table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCirculaire {
    pub id: Uuid,
    pub filename: String,
    pub date: Option<NaiveDate>,
    pub circulaire_number: Option<String>,
    pub year: Option<String>,
    pub ocr_used: bool,
    pub medications_count: i64,
    pub sections: Vec<SectionSummary>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn sample() -> ParsedCirculaire {
        ParsedCirculaire {
            filename: "circ0725.pdf".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 15),
            circulaire_number: Some("2025/07".to_string()),
            medications: vec![Medication {
                code: Some("301234".to_string()),
                name: "DOLIPRANE 1000mg Comp. Bt 8".to_string(),
                laboratory: Some("SANOFI".to_string()),
                price_wholesale: 2.970,
                price_pharmacy: 3.420,
                price_public: Some(4.158),
                price_public_calculated: false,
                category: Some(Category::A),
                margin: Some(0.738),
                med_type: MedType::New,
                specialty: Specialty::Human,
                origin: Origin::Local,
            }],
            sections_found: vec![SectionSummary {
                med_type: MedType::New,
                specialty: Specialty::Human,
                origin: Origin::Local,
                medications_count: 1,
            }],
            ocr_used: true,
        }
    }

    #[test]
    fn parsed_circulaire_survives_json_round_trip() {
        let parsed = sample();
        let json = serde_json::to_string(&parsed).unwrap();
        let back: ParsedCirculaire = serde_json::from_str(&json).unwrap();
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            serde_json::to_value(&back).unwrap()
        );
    }

    #[test]
    fn json_shape_uses_iso_date_and_type_key() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["date"], "2025-03-15");
        assert_eq!(value["medications"][0]["type"], "new");
        assert_eq!(value["sections_found"][0]["type"], "new");
        assert_eq!(value["ocr_used"], true);
    }

    #[test]
    fn ocr_flag_defaults_false_for_older_documents() {
        let json = r#"{"filename":"circ0124.pdf","date":null,"circulaire_number":null,
                       "medications":[],"sections_found":[]}"#;
        let back: ParsedCirculaire = serde_json::from_str(json).unwrap();
        assert!(!back.ocr_used);
    }
}
