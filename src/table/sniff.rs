//! Column type sniffing and coercion
//!
//! Columns are classified at render time, not at fetch time: candidacy for
//! the value axis depends on which column was picked as the key, so the
//! listings are recomputed per call instead of cached.
//!
//! The whole-column tests (date-like, numeric-convertible) reduce a
//! per-cell fallible parse to a single boolean: one unparseable cell
//! disqualifies the column. Per-cell coercion is the lenient counterpart,
//! turning unparseable cells into missing values.

use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Datetime formats tried before the date-only formats
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats; parsed values get a midnight time component
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Strip a cell down to numeric-looking characters
///
/// Keeps digits, comma, period, and minus, then replaces every comma with a
/// period. The replacement is blind to thousands separators on purpose:
/// `"1.234,56"` becomes `"1.234.56"`, which later fails to parse. That
/// matches the dashboard this reproduces; do not make it locale-aware.
pub fn clean_numeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.' || *c == '-')
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Fallible per-cell numeric parse: clean, then parse as f64
pub fn parse_numeric_cell(raw: &str) -> Option<f64> {
    clean_numeric(raw).parse::<f64>().ok()
}

/// Fallible per-cell date parse over the candidate format table
pub fn parse_datetime_cell(raw: &str) -> Option<NaiveDateTime> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Whether a dtype counts as already numeric
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Categorical test: text-typed, not already numeric
pub fn is_categorical(series: &Series) -> bool {
    matches!(series.dtype(), DataType::String)
}

/// View a column as per-row optional text
pub fn column_as_strings(series: &Series) -> Result<Vec<Option<String>>> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|cell| cell.map(str::to_string))
        .collect())
}

/// Numeric-convertible test
///
/// True when every cell of a non-numeric column cleans and parses as a
/// number with zero failures. A null cell fails too: the source dashboard
/// stringified missing values into unparseable text, so columns with holes
/// were never offered as value candidates.
pub fn is_numeric_convertible(series: &Series) -> Result<bool> {
    if is_numeric_dtype(series.dtype()) {
        return Ok(false);
    }
    let cells = column_as_strings(series)?;
    Ok(cells
        .iter()
        .all(|cell| cell.as_deref().and_then(parse_numeric_cell).is_some()))
}

/// Date test: every non-null cell, taken as text, parses as a date/time
pub fn is_date_like(series: &Series) -> Result<bool> {
    let cells = column_as_strings(series)?;
    Ok(cells
        .iter()
        .flatten()
        .all(|cell| parse_datetime_cell(cell).is_some()))
}

/// Per-cell numeric coercion; failures become missing values
pub fn coerce_numeric_cells(series: &Series) -> Result<Vec<Option<f64>>> {
    if is_numeric_dtype(series.dtype()) {
        let cast = series.cast(&DataType::Float64)?;
        return Ok(cast.f64()?.into_iter().collect());
    }
    let cells = column_as_strings(series)?;
    Ok(cells
        .iter()
        .map(|cell| cell.as_deref().and_then(parse_numeric_cell))
        .collect())
}

/// Per-cell date coercion; failures become missing values
pub fn coerce_datetime_cells(series: &Series) -> Result<Vec<Option<NaiveDateTime>>> {
    let cells = column_as_strings(series)?;
    Ok(cells
        .iter()
        .map(|cell| cell.as_deref().and_then(parse_datetime_cell))
        .collect())
}

/// Key-column candidates: text columns, sorted by name
pub fn categorical_candidates(df: &DataFrame) -> Vec<String> {
    let mut candidates: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| is_categorical(col.as_materialized_series()))
        .map(|col| col.name().to_string())
        .collect();
    candidates.sort();
    candidates
}

/// Value-column candidates for a given key column
///
/// Already-numeric columns plus numeric-convertible text columns, with the
/// key column excluded, sorted and deduplicated.
pub fn numeric_candidates(df: &DataFrame, exclude: &str) -> Result<Vec<String>> {
    let mut candidates = Vec::new();

    for col in df.get_columns() {
        let name = col.name().as_str();
        if name == exclude {
            continue;
        }
        let series = col.as_materialized_series();
        if is_numeric_dtype(series.dtype()) || is_numeric_convertible(series)? {
            candidates.push(name.to_string());
        }
    }

    candidates.sort();
    candidates.dedup();
    Ok(candidates)
}
