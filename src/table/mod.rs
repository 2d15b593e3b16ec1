//! Record Set construction and export
//!
//! A Record Set is a polars DataFrame built from the raw JSON row objects
//! of one fetch. Column labels are normalized exactly once, before the
//! frame is stored; per-column storage types are inferred from the JSON
//! values. The frame is immutable for its lifetime and replaced wholesale
//! by the next successful fetch.
//!
//! Structure:
//! - `normalize.rs`: column label normalization
//! - `sniff.rs`: render-time type sniffing and coercion

pub mod normalize;
pub mod sniff;

use crate::error::Result;
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};

/// Inferred storage type for one column of raw JSON values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InferredType {
    Int,
    Float,
    Bool,
    Text,
}

/// Schema summary for one column: label, storage type, missing-value count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
}

/// Build a Record Set from raw JSON row objects
///
/// Column order is first-seen order across all rows; labels are normalized
/// before the frame is built. Zero rows yield an empty frame, which is a
/// valid (informational) outcome, not an error.
pub fn records_to_frame(records: &[Map<String, Value>]) -> Result<DataFrame> {
    if records.is_empty() {
        return Ok(DataFrame::empty());
    }

    // Column labels in first-seen order
    let mut raw_labels: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !raw_labels.iter().any(|existing| existing == key) {
                raw_labels.push(key.clone());
            }
        }
    }
    let labels = normalize::normalize_labels(&raw_labels);

    let mut columns: Vec<Column> = Vec::with_capacity(labels.len());
    for (raw, label) in raw_labels.iter().zip(&labels) {
        let series = build_series(records, raw, label);
        columns.push(Column::from(series));
    }

    Ok(DataFrame::new(columns)?)
}

/// Build one typed Series for a raw column key
fn build_series(records: &[Map<String, Value>], raw_key: &str, label: &str) -> Series {
    match infer_column_type(records, raw_key) {
        InferredType::Int => {
            let cells: Vec<Option<i64>> = records
                .iter()
                .map(|record| record.get(raw_key).and_then(Value::as_i64))
                .collect();
            Series::new(label.into(), cells)
        }
        InferredType::Float => {
            let cells: Vec<Option<f64>> = records
                .iter()
                .map(|record| record.get(raw_key).and_then(Value::as_f64))
                .collect();
            Series::new(label.into(), cells)
        }
        InferredType::Bool => {
            let cells: Vec<Option<bool>> = records
                .iter()
                .map(|record| record.get(raw_key).and_then(Value::as_bool))
                .collect();
            Series::new(label.into(), cells)
        }
        InferredType::Text => {
            let cells: Vec<Option<String>> = records
                .iter()
                .map(|record| record.get(raw_key).and_then(scalar_to_string))
                .collect();
            Series::new(label.into(), cells)
        }
    }
}

/// Infer a column's storage type from its non-null JSON values
///
/// All integers => Int64, any other number => Float64, all booleans =>
/// Boolean, anything else (or no values at all) => String.
fn infer_column_type(records: &[Map<String, Value>], raw_key: &str) -> InferredType {
    let mut saw_value = false;
    let mut all_bool = true;
    let mut all_int = true;
    let mut all_number = true;

    for record in records {
        match record.get(raw_key) {
            None | Some(Value::Null) => continue,
            Some(Value::Bool(_)) => {
                saw_value = true;
                all_int = false;
                all_number = false;
            }
            Some(Value::Number(n)) => {
                saw_value = true;
                all_bool = false;
                if n.as_i64().is_none() {
                    all_int = false;
                }
            }
            Some(_) => {
                saw_value = true;
                all_bool = false;
                all_int = false;
                all_number = false;
            }
        }
    }

    if !saw_value {
        InferredType::Text
    } else if all_bool {
        InferredType::Bool
    } else if all_int {
        InferredType::Int
    } else if all_number {
        InferredType::Float
    } else {
        InferredType::Text
    }
}

/// Stringify a JSON scalar for a text column; null stays missing
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Per-column schema summary: label, storage type, missing-value count
pub fn schema_summary(df: &DataFrame) -> Vec<ColumnSummary> {
    df.get_columns()
        .iter()
        .map(|col| {
            let series = col.as_materialized_series();
            ColumnSummary {
                name: series.name().to_string(),
                dtype: series.dtype().to_string(),
                null_count: series.null_count(),
            }
        })
        .collect()
}

/// Export the Record Set as UTF-8 CSV bytes with a header row
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut frame = df.clone();
    CsvWriter::new(&mut out)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(out)
}

/// First `n` rows, for a quick tabular view
pub fn preview(df: &DataFrame, n: usize) -> DataFrame {
    df.head(Some(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().expect("test record").clone()
    }

    #[test]
    fn test_records_to_frame_types_and_order() {
        let records = vec![
            record(json!({"Región": "RM", "Total": 10, "Tasa": 1.5, "Activo": true})),
            record(json!({"Región": "V", "Total": 20, "Tasa": 2.0, "Activo": false})),
        ];

        let df = records_to_frame(&records).unwrap();
        assert_eq!(df.height(), 2);

        let names: Vec<&str> = df
            .get_columns()
            .iter()
            .map(|c| c.name().as_str())
            .collect();
        assert_eq!(names, vec!["regin", "total", "tasa", "activo"]);

        assert_eq!(df.column("regin").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("total").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("tasa").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("activo").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_records_to_frame_mixed_values_become_text() {
        let records = vec![
            record(json!({"v": 10})),
            record(json!({"v": "diez"})),
            record(json!({"v": null})),
        ];

        let df = records_to_frame(&records).unwrap();
        let col = df.column("v").unwrap();
        assert_eq!(col.dtype(), &DataType::String);
        assert_eq!(col.as_materialized_series().null_count(), 1);
    }

    #[test]
    fn test_records_to_frame_missing_keys_are_null() {
        let records = vec![
            record(json!({"a": 1, "b": "x"})),
            record(json!({"a": 2})),
            record(json!({"b": "y", "c": 3})),
        ];

        let df = records_to_frame(&records).unwrap();
        let names: Vec<&str> = df
            .get_columns()
            .iter()
            .map(|c| c.name().as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(df.column("a").unwrap().as_materialized_series().null_count(), 1);
        assert_eq!(df.column("c").unwrap().as_materialized_series().null_count(), 2);
    }

    #[test]
    fn test_records_to_frame_empty_is_empty_frame() {
        let df = records_to_frame(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 0);
    }

    #[test]
    fn test_schema_summary() {
        let records = vec![
            record(json!({"region": "RM", "total": 10})),
            record(json!({"region": null, "total": 20})),
        ];
        let df = records_to_frame(&records).unwrap();

        let summary = schema_summary(&df);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].name, "region");
        assert_eq!(summary[0].null_count, 1);
        assert_eq!(summary[1].name, "total");
        assert_eq!(summary[1].null_count, 0);
    }

    #[test]
    fn test_csv_export_has_header_row() {
        let df = df!(
            "region" => &["RM", "V"],
            "total" => &[10i64, 20]
        )
        .unwrap();

        let bytes = to_csv_bytes(&df).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("region,total"));
        assert_eq!(lines.next(), Some("RM,10"));
        assert_eq!(lines.next(), Some("V,20"));
    }

    #[test]
    fn test_preview_caps_rows() {
        let df = df!("n" => &[1i64, 2, 3, 4, 5]).unwrap();
        assert_eq!(preview(&df, 3).height(), 3);
        assert_eq!(preview(&df, 10).height(), 5);
    }
}
