//! Date-bucketed aggregation
//!
//! Parses the key column as calendar dates (rows whose key fails to parse
//! are dropped), buckets rows into fixed daily/weekly/monthly intervals,
//! and per bucket either counts rows or sums the coerced value column.
//! The series covers every interval between the first and last populated
//! bucket, so gaps show up as zeros; weeks start on Monday. No Top-N
//! truncation applies; the full chronological series is kept.

use super::{BucketFrequency, ChartSeries, SeriesPoint};
use crate::error::Result;
use crate::table::sniff;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    count: usize,
    sum: f64,
}

/// Aggregate a Record Set into a chronological series
///
/// `value_column = None` counts rows per bucket; otherwise the coerced
/// value column is summed. Returns `Ok(None)` when no row has a parseable
/// date key.
pub fn aggregate_time_series(
    df: &DataFrame,
    key_column: &str,
    value_column: Option<&str>,
    frequency: BucketFrequency,
) -> Result<Option<ChartSeries>> {
    let stamps = sniff::coerce_datetime_cells(df.column(key_column)?.as_materialized_series())?;
    let values: Vec<Option<f64>> = match value_column {
        Some(value_col) => {
            sniff::coerce_numeric_cells(df.column(value_col)?.as_materialized_series())?
        }
        None => vec![None; stamps.len()],
    };

    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    for (stamp, value) in stamps.iter().zip(&values) {
        let Some(stamp) = stamp else { continue };
        let bucket = buckets.entry(bucket_start(*stamp, frequency)).or_default();
        bucket.count += 1;
        if let Some(value) = value {
            bucket.sum += value;
        }
    }

    let (Some(first), Some(last)) = (
        buckets.keys().next().copied(),
        buckets.keys().next_back().copied(),
    ) else {
        debug!(key = key_column, "no parseable dates in key column");
        return Ok(None);
    };

    // Fill calendar gaps so the series covers every interval
    let mut cursor = first;
    while cursor < last {
        cursor = match next_bucket(cursor, frequency) {
            Some(next) if next <= last => next,
            _ => break,
        };
        buckets.entry(cursor).or_default();
    }

    let points: Vec<SeriesPoint> = buckets
        .iter()
        .map(|(start, bucket)| SeriesPoint {
            key: bucket_label(*start, frequency),
            value: match value_column {
                Some(_) => bucket.sum,
                None => bucket.count as f64,
            },
        })
        .collect();

    let (y_label, title) = match value_column {
        Some(value_col) => (
            format!("Sum of {}", value_col),
            format!("Time series ({}, {})", value_col, frequency),
        ),
        None => (
            "Count".to_string(),
            format!("Time series (count, {})", frequency),
        ),
    };

    Ok(Some(ChartSeries {
        points,
        x_label: "Date".to_string(),
        y_label,
        title,
    }))
}

/// Start of the calendar interval containing a timestamp
fn bucket_start(stamp: NaiveDateTime, frequency: BucketFrequency) -> NaiveDate {
    let date = stamp.date();
    match frequency {
        BucketFrequency::Daily => date,
        BucketFrequency::Weekly => date
            .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
            .unwrap_or(date),
        BucketFrequency::Monthly => {
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
        }
    }
}

/// Start of the next calendar interval, if representable
fn next_bucket(start: NaiveDate, frequency: BucketFrequency) -> Option<NaiveDate> {
    match frequency {
        BucketFrequency::Daily => start.checked_add_days(Days::new(1)),
        BucketFrequency::Weekly => start.checked_add_days(Days::new(7)),
        BucketFrequency::Monthly => {
            let (year, month) = if start.month() == 12 {
                (start.year() + 1, 1)
            } else {
                (start.year(), start.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1)
        }
    }
}

/// Axis label for a bucket start
fn bucket_label(start: NaiveDate, frequency: BucketFrequency) -> String {
    match frequency {
        BucketFrequency::Monthly => start.format("%Y-%m").to_string(),
        _ => start.format("%Y-%m-%d").to_string(),
    }
}
