//! Full-data export and CSV output of food entries.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::models::{ExportData, FoodEntry};

/// Current `ExportData::version`. Imports of newer versions are rejected.
pub const EXPORT_VERSION: i64 = 1;

#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    date: &'a str,
    meal_type: &'static str,
    name: &'a str,
    calories: i64,
    protein: f64,
    carbs: f64,
    fat: f64,
    serving_size: f64,
    serving_unit: &'a str,
    created_at: &'a str,
}

impl<'a> From<&'a FoodEntry> for CsvRow<'a> {
    fn from(e: &'a FoodEntry) -> Self {
        CsvRow {
            id: e.id,
            date: &e.date,
            meal_type: e.meal_type.as_str(),
            name: &e.name,
            calories: e.calories,
            protein: e.protein,
            carbs: e.carbs,
            fat: e.fat,
            serving_size: e.serving_size,
            serving_unit: &e.serving_unit,
            created_at: &e.created_at,
        }
    }
}

/// Write entries as CSV with a header row. An empty slice still writes the
/// header.
pub fn write_entries_csv<W: Write>(entries: &[FoodEntry], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record([
        "id",
        "date",
        "meal_type",
        "name",
        "calories",
        "protein",
        "carbs",
        "fat",
        "serving_size",
        "serving_unit",
        "created_at",
    ])?;
    for entry in entries {
        wtr.serialize(CsvRow::from(entry))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Parse an export document, as written by `serde_json::to_string_pretty`.
pub fn parse_export(json: &str) -> Result<ExportData> {
    Ok(serde_json::from_str(json)?)
}
