use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::circulaire::{ParsedCirculaire, SectionSummary, StoredCirculaire};
use crate::models::enums::{Category, MedType, Origin, Specialty};
use crate::models::medication::Medication;

/// Store a parse result, replacing any earlier parse of the same filename.
///
/// Runs in one transaction: the old parent row is deleted first (children go
/// with it via the cascade), then the new parent and its medication rows are
/// inserted with 0-based positions. Reprocessing a circulaire is therefore
/// idempotent. A parse with zero medications is still stored.
pub fn insert_parsed(
    conn: &Connection,
    parsed: &ParsedCirculaire,
    year: Option<&str>,
) -> Result<StoredCirculaire, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "DELETE FROM circulaires WHERE filename = ?1",
        params![parsed.filename],
    )?;

    let id = Uuid::new_v4();
    let created_at = Utc::now();
    let sections_json =
        serde_json::to_string(&parsed.sections_found).unwrap_or_else(|_| "[]".to_string());

    tx.execute(
        "INSERT INTO circulaires (id, filename, date, circulaire_number, year, ocr_used,
         medications_count, sections_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id.to_string(),
            parsed.filename,
            parsed.date.map(|d| d.to_string()),
            parsed.circulaire_number,
            year,
            parsed.ocr_used as i32,
            parsed.medications.len() as i64,
            sections_json,
            created_at.to_rfc3339(),
        ],
    )?;

    for (position, med) in parsed.medications.iter().enumerate() {
        tx.execute(
            "INSERT INTO circulaire_medications (id, circulaire_id, code, name, laboratory,
             price_wholesale, price_pharmacy, price_public, price_public_calculated,
             category, margin, med_type, specialty, origin, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                Uuid::new_v4().to_string(),
                id.to_string(),
                med.code,
                med.name,
                med.laboratory,
                med.price_wholesale,
                med.price_pharmacy,
                med.price_public,
                med.price_public_calculated as i32,
                med.category.map(|c| c.as_str()),
                med.margin,
                med.med_type.as_str(),
                med.specialty.as_str(),
                med.origin.as_str(),
                position as i64,
            ],
        )?;
    }

    tx.commit()?;

    Ok(StoredCirculaire {
        id,
        filename: parsed.filename.clone(),
        date: parsed.date,
        circulaire_number: parsed.circulaire_number.clone(),
        year: year.map(|y| y.to_string()),
        ocr_used: parsed.ocr_used,
        medications_count: parsed.medications.len() as i64,
        sections: parsed.sections_found.clone(),
        created_at,
    })
}

pub fn get_by_filename(
    conn: &Connection,
    filename: &str,
) -> Result<Option<StoredCirculaire>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, date, circulaire_number, year, ocr_used,
         medications_count, sections_json, created_at
         FROM circulaires WHERE filename = ?1",
    )?;

    let row = stmt
        .query_row(params![filename], circulaire_row_from_rusqlite)
        .optional()?;

    match row {
        Some(row) => Ok(Some(circulaire_from_row(row)?)),
        None => Ok(None),
    }
}

pub fn list_circulaires(conn: &Connection) -> Result<Vec<StoredCirculaire>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, date, circulaire_number, year, ocr_used,
         medications_count, sections_json, created_at
         FROM circulaires ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([], circulaire_row_from_rusqlite)?;

    let mut circulaires = Vec::new();
    for row in rows {
        circulaires.push(circulaire_from_row(row?)?);
    }
    Ok(circulaires)
}

/// Medication rows for one stored circulaire, in parse order.
pub fn medications_for(
    conn: &Connection,
    circulaire_id: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT code, name, laboratory, price_wholesale, price_pharmacy, price_public,
         price_public_calculated, category, margin, med_type, specialty, origin
         FROM circulaire_medications WHERE circulaire_id = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![circulaire_id.to_string()], |row| {
        Ok(MedicationRow {
            code: row.get(0)?,
            name: row.get(1)?,
            laboratory: row.get(2)?,
            price_wholesale: row.get(3)?,
            price_pharmacy: row.get(4)?,
            price_public: row.get(5)?,
            price_public_calculated: row.get::<_, i32>(6)? != 0,
            category: row.get(7)?,
            margin: row.get(8)?,
            med_type: row.get(9)?,
            specialty: row.get(10)?,
            origin: row.get(11)?,
        })
    })?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row?)?);
    }
    Ok(meds)
}

/// Total medication rows across all stored circulaires.
pub fn count_medications(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM circulaire_medications", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(count)
}

// Internal row types keep the rusqlite closures infallible; string fields are
// converted to typed ones in a second step so enum and uuid errors surface as
// DatabaseError instead of panics.

struct CirculaireRow {
    id: String,
    filename: String,
    date: Option<String>,
    circulaire_number: Option<String>,
    year: Option<String>,
    ocr_used: i32,
    medications_count: i64,
    sections_json: String,
    created_at: String,
}

fn circulaire_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<CirculaireRow, rusqlite::Error> {
    Ok(CirculaireRow {
        id: row.get(0)?,
        filename: row.get(1)?,
        date: row.get(2)?,
        circulaire_number: row.get(3)?,
        year: row.get(4)?,
        ocr_used: row.get(5)?,
        medications_count: row.get(6)?,
        sections_json: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn circulaire_from_row(row: CirculaireRow) -> Result<StoredCirculaire, DatabaseError> {
    let sections: Vec<SectionSummary> =
        serde_json::from_str(&row.sections_json).unwrap_or_default();

    Ok(StoredCirculaire {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        filename: row.filename,
        date: row
            .date
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        circulaire_number: row.circulaire_number,
        year: row.year,
        ocr_used: row.ocr_used != 0,
        medications_count: row.medications_count,
        sections,
        created_at: DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default(),
    })
}

struct MedicationRow {
    code: Option<String>,
    name: String,
    laboratory: Option<String>,
    price_wholesale: f64,
    price_pharmacy: f64,
    price_public: Option<f64>,
    price_public_calculated: bool,
    category: Option<String>,
    margin: Option<f64>,
    med_type: String,
    specialty: String,
    origin: String,
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, DatabaseError> {
    let category = match row.category {
        Some(s) => Some(Category::from_str(&s)?),
        None => None,
    };

    Ok(Medication {
        code: row.code,
        name: row.name,
        laboratory: row.laboratory,
        price_wholesale: row.price_wholesale,
        price_pharmacy: row.price_pharmacy,
        price_public: row.price_public,
        price_public_calculated: row.price_public_calculated,
        category,
        margin: row.margin,
        med_type: MedType::from_str(&row.med_type)?,
        specialty: Specialty::from_str(&row.specialty)?,
        origin: Origin::from_str(&row.origin)?,
    })
}
