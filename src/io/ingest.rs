//! CSV ingest and normalization.
//!
//! This module is responsible for turning the three source CSVs into clean
//! `(year, value)` tables that are safe to merge.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 3)
//! - **Row-level reporting** for missing observations (skip, but say so)
//! - **One time key**: every source ends up keyed by an integer year
//! - **Separation of concerns**: no merging or derivation here

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{Metric, PerMetric, SeriesPoint, SeriesTable};
use crate::error::DataError;

/// How a source encodes its time key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKey {
    /// A calendar date string; only its year is kept.
    Date,
    /// A year, possibly written as an integral float (`2019.0`).
    Year,
}

/// Where and how one metric is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpec {
    pub metric: Metric,
    pub file_name: &'static str,
    pub time_column: &'static str,
    pub time_key: TimeKey,
}

impl SourceSpec {
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::Housing => SourceSpec {
                metric,
                file_name: "housing_prices.csv",
                time_column: "date",
                time_key: TimeKey::Date,
            },
            Metric::Income => SourceSpec {
                metric,
                file_name: "median_income.csv",
                time_column: "year",
                time_key: TimeKey::Year,
            },
            Metric::Population => SourceSpec {
                metric,
                file_name: "population.csv",
                time_column: "year",
                time_key: TimeKey::Year,
            },
        }
    }

    pub fn value_column(&self) -> &'static str {
        self.metric.column()
    }

    pub fn path_in(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name)
    }
}

/// A row-level problem that did not stop the load.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output for a single source.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub path: PathBuf,
    pub table: SeriesTable,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load all three sources from `data_dir`.
///
/// Row-level skips are logged; any schema problem aborts the load.
pub fn load_sources(data_dir: &Path) -> Result<PerMetric<SeriesTable>, DataError> {
    let housing = load_reported(data_dir, Metric::Housing)?;
    let income = load_reported(data_dir, Metric::Income)?;
    let population = load_reported(data_dir, Metric::Population)?;
    Ok(PerMetric {
        housing,
        income,
        population,
    })
}

fn load_reported(data_dir: &Path, metric: Metric) -> Result<SeriesTable, DataError> {
    let loaded = load_source(data_dir, SourceSpec::for_metric(metric))?;
    for err in &loaded.row_errors {
        log::warn!("{}:{}: {}", loaded.path.display(), err.line, err.message);
    }
    log::debug!(
        "loaded {}: {} of {} rows",
        loaded.path.display(),
        loaded.table.points.len(),
        loaded.rows_read
    );
    Ok(loaded.table)
}

/// Load and normalize one source CSV.
pub fn load_source(data_dir: &Path, spec: SourceSpec) -> Result<LoadedSource, DataError> {
    let path = spec.path_in(data_dir);
    let file = File::open(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataError::DataNotFound { path: path.clone() },
        _ => DataError::Io(e),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| DataError::schema(&path, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    for column in [spec.time_column, spec.value_column()] {
        if !header_map.contains_key(column) {
            return Err(DataError::schema(&path, format!("Missing required column: `{column}`")));
        }
    }

    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header line, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = result.map_err(|e| DataError::schema(&path, format!("line {line}: CSV parse error: {e}")))?;

        let year = get_required(&record, &header_map, spec.time_column)
            .and_then(|raw| parse_time_key(raw, spec.time_key))
            .map_err(|msg| DataError::schema(&path, format!("line {line}: {msg}")))?;

        let Some(raw_value) = get_optional(&record, &header_map, spec.value_column()) else {
            row_errors.push(RowError {
                line,
                message: format!("Missing `{}` value for {year}; row skipped.", spec.value_column()),
            });
            continue;
        };

        let value = parse_f64(raw_value).ok_or_else(|| {
            DataError::schema(
                &path,
                format!("line {line}: invalid `{}` value '{raw_value}'", spec.value_column()),
            )
        })?;

        if by_year.insert(year, value).is_some() {
            return Err(DataError::schema(&path, format!("line {line}: duplicate year {year}")));
        }
    }

    let points = by_year
        .into_iter()
        .map(|(year, value)| SeriesPoint { year, value })
        .collect();

    Ok(LoadedSource {
        path,
        table: SeriesTable {
            metric: spec.metric,
            points,
        },
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

/// FRED writes `.` for missing observations; treat it like an empty cell.
fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ".")
}

fn parse_time_key(raw: &str, kind: TimeKey) -> Result<i32, String> {
    match kind {
        TimeKey::Date => parse_date_year(raw),
        TimeKey::Year => parse_year(raw),
    }
}

fn parse_date_year(s: &str) -> Result<i32, String> {
    const DATE_FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.year());
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.year());
        }
    }
    if s.len() == 4 {
        if let Ok(year) = s.parse::<i32>() {
            return Ok(year);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, MM/DD/YYYY, YYYY."
    ))
}

fn parse_year(s: &str) -> Result<i32, String> {
    if let Ok(year) = s.parse::<i32>() {
        return Ok(year);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 => Ok(v as i32),
        _ => Err(format!("Invalid year '{s}'.")),
    }
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
