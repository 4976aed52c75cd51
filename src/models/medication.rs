use serde::{Deserialize, Serialize};

use super::enums::{Category, MedType, Origin, Specialty};

/// One medication row parsed out of a circulaire price table.
///
/// Prices are in Tunisian dinars with 3 fractional digits (millimes).
/// `price_public` is only present when the table printed it; otherwise it may
/// be estimated from the pharmacy price, in which case
/// `price_public_calculated` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub code: Option<String>,
    pub name: String,
    pub laboratory: Option<String>,
    pub price_wholesale: f64,
    pub price_pharmacy: f64,
    pub price_public: Option<f64>,
    #[serde(default)]
    pub price_public_calculated: bool,
    pub category: Option<Category>,
    pub margin: Option<f64>,
    #[serde(rename = "type")]
    pub med_type: MedType,
    pub specialty: Specialty,
    pub origin: Origin,
}

/// Medication view used inside laboratory-grouped output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedMedication {
    pub code: Option<String>,
    pub name: String,
    pub sale_price: Option<f64>,
    pub pharmacy_price: f64,
    pub wholesale_price: f64,
    pub category: Option<Category>,
}

impl SimplifiedMedication {
    pub fn from_medication(med: &Medication) -> Self {
        Self {
            code: med.code.clone(),
            name: med.name.clone(),
            sale_price: med.price_public,
            pharmacy_price: med.price_pharmacy,
            wholesale_price: med.price_wholesale,
            category: med.category,
        }
    }
}
