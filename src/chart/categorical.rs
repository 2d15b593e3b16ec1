//! Categorical-key aggregation
//!
//! Groups rows by the exact value of a key column and combines a coerced
//! value column per group, or just counts key occurrences. The series is
//! then sorted by value and truncated to Top-N. Grouping preserves the
//! first-seen key order before the sort, and null keys are dropped.

use super::{ChartSeries, CombineStrategy, SeriesPoint, SortDirection};
use crate::error::Result;
use crate::table::sniff;
use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Aggregate a Record Set by a key column
///
/// `value_column = None` is count-only mode. Returns `Ok(None)` when the
/// aggregable result is empty; callers treat that as "nothing to display".
pub fn aggregate_categorical(
    df: &DataFrame,
    key_column: &str,
    value_column: Option<&str>,
    strategy: CombineStrategy,
    top_n: usize,
    direction: SortDirection,
) -> Result<Option<ChartSeries>> {
    let keys = sniff::column_as_strings(df.column(key_column)?.as_materialized_series())?;

    let mut points = match value_column {
        None => count_keys(&keys),
        Some(value_col) => {
            let values =
                sniff::coerce_numeric_cells(df.column(value_col)?.as_materialized_series())?;
            match strategy {
                CombineStrategy::First => first_per_key(&keys, &values),
                CombineStrategy::Sum | CombineStrategy::Mean => {
                    combine_groups(&keys, &values, strategy)
                }
            }
        }
    };

    sort_by_value(&mut points, direction);
    points.truncate(top_n);

    if points.is_empty() {
        debug!(key = key_column, "categorical aggregation produced no points");
        return Ok(None);
    }

    let (y_label, title) = match value_column {
        None => (
            "Count".to_string(),
            format!("Count by {}", key_column),
        ),
        Some(value_col) => {
            let y_label = match strategy {
                CombineStrategy::First => value_col.to_string(),
                CombineStrategy::Sum => format!("Sum of {}", value_col),
                CombineStrategy::Mean => format!("Mean of {}", value_col),
            };
            let title = format!("{} by {} ({})", value_col, key_column, strategy);
            (y_label, title)
        }
    };

    Ok(Some(ChartSeries {
        points,
        x_label: key_column.to_string(),
        y_label,
        title,
    }))
}

/// Occurrence count per distinct key, first-seen order
fn count_keys(keys: &[Option<String>]) -> Vec<SeriesPoint> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for key in keys.iter().flatten() {
        if !counts.contains_key(key) {
            order.push(key.clone());
        }
        *counts.entry(key.clone()).or_insert(0) += 1;
    }

    order
        .into_iter()
        .map(|key| {
            let value = counts[&key] as f64;
            SeriesPoint { key, value }
        })
        .collect()
}

/// First non-missing value per key; later duplicates are dropped
fn first_per_key(keys: &[Option<String>], values: &[Option<f64>]) -> Vec<SeriesPoint> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut points = Vec::new();

    for (key, value) in keys.iter().zip(values) {
        let (Some(key), Some(value)) = (key, value) else {
            continue;
        };
        if seen.insert(key.clone()) {
            points.push(SeriesPoint {
                key: key.clone(),
                value: *value,
            });
        }
    }

    points
}

/// Sum or mean of the non-missing values per key
///
/// A group whose values are all missing sums to 0.0 and means to NaN,
/// matching pandas' skip-missing reductions.
fn combine_groups(
    keys: &[Option<String>],
    values: &[Option<f64>],
    strategy: CombineStrategy,
) -> Vec<SeriesPoint> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();

    for (key, value) in keys.iter().zip(values) {
        let Some(key) = key else { continue };
        if !groups.contains_key(key) {
            order.push(key.clone());
        }
        let group = groups.entry(key.clone()).or_default();
        if let Some(value) = value {
            group.push(*value);
        }
    }

    order
        .into_iter()
        .map(|key| {
            let group = &groups[&key];
            let value = match strategy {
                CombineStrategy::Sum => group.iter().sum(),
                _ => {
                    if group.is_empty() {
                        f64::NAN
                    } else {
                        group.iter().sum::<f64>() / group.len() as f64
                    }
                }
            };
            SeriesPoint { key, value }
        })
        .collect()
}

/// Stable value sort; ties keep first-seen key order
///
/// NaN (a Mean group with no non-missing values) sinks to the end in both
/// directions, as pandas' sort_values does, so it can never displace a
/// real value from the Top-N window.
fn sort_by_value(points: &mut [SeriesPoint], direction: SortDirection) {
    points.sort_by(|a, b| match (a.value.is_nan(), b.value.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match direction {
            SortDirection::Ascending => {
                a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal)
            }
            SortDirection::Descending => {
                b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal)
            }
        },
    });
}
