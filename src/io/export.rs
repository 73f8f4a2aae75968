//! Export the (filtered) merged table to CSV.
//!
//! Column names match the source files and the derived column names, so the
//! export can be loaded straight back into a spreadsheet or dataframe.
//! Undefined index/YoY cells are written as empty fields.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{MergedRow, Metric};
use crate::error::{AppError, EXIT_DATA};

#[derive(Debug, Serialize)]
struct ExportRow {
    year: i32,
    housing_price_index: f64,
    median_income: f64,
    population: f64,
    #[serde(rename = "HPI_idx")]
    hpi_idx: Option<f64>,
    #[serde(rename = "Income_idx")]
    income_idx: Option<f64>,
    #[serde(rename = "Pop_idx")]
    pop_idx: Option<f64>,
    #[serde(rename = "HPI_yoy_pct")]
    hpi_yoy_pct: Option<f64>,
    #[serde(rename = "Income_yoy_pct")]
    income_yoy_pct: Option<f64>,
    #[serde(rename = "Pop_yoy_pct")]
    pop_yoy_pct: Option<f64>,
}

impl From<&MergedRow> for ExportRow {
    fn from(row: &MergedRow) -> Self {
        Self {
            year: row.year,
            housing_price_index: row.raw.housing,
            median_income: row.raw.income,
            population: row.raw.population,
            hpi_idx: row.index.get(Metric::Housing).value(),
            income_idx: row.index.get(Metric::Income).value(),
            pop_idx: row.index.get(Metric::Population).value(),
            hpi_yoy_pct: row.yoy.get(Metric::Housing).value(),
            income_yoy_pct: row.yoy.get(Metric::Income).value(),
            pop_yoy_pct: row.yoy.get(Metric::Population).value(),
        }
    }
}

/// Write merged rows to a CSV file.
pub fn write_table_csv(path: &Path, rows: &[MergedRow]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_DATA, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_table(file, rows)?;
    log::info!("exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write merged rows as CSV to any writer.
pub fn write_table<W: Write>(out: W, rows: &[MergedRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer
            .serialize(ExportRow::from(row))
            .map_err(|e| AppError::new(EXIT_DATA, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(EXIT_DATA, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
