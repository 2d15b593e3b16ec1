//! Chart aggregation
//!
//! Turns the current Record Set into ordered (key, value) series ready for
//! bar or line rendering. Two shapes exist: categorical-key aggregation
//! (group, combine, sort by value, Top-N) and date-bucketed aggregation
//! (parse dates, bucket into calendar intervals, count or sum).
//!
//! Structure:
//! - `categorical.rs`: categorical-key aggregation
//! - `timeseries.rs`: date-bucketed aggregation

pub mod categorical;
pub mod timeseries;

use serde::Serialize;
use std::fmt;

pub use categorical::aggregate_categorical;
pub use timeseries::aggregate_time_series;

/// How rows sharing a key are reduced to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineStrategy {
    /// First non-missing occurrence, original row order
    #[default]
    First,
    /// Sum of non-missing values
    Sum,
    /// Arithmetic mean of non-missing values
    Mean,
}

impl CombineStrategy {
    /// Parse from string value; unknown values fall back to First
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "sum" => Self::Sum,
            "mean" | "average" => Self::Mean,
            _ => Self::First,
        }
    }
}

impl fmt::Display for CombineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::First => "first value",
            Self::Sum => "sum",
            Self::Mean => "mean",
        };
        write!(f, "{}", label)
    }
}

/// Value-sort direction for categorical series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Calendar interval for date-bucketed aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl BucketFrequency {
    /// Parse from string value; unknown values fall back to Daily
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "w" | "weekly" => Self::Weekly,
            "m" | "monthly" => Self::Monthly,
            _ => Self::Daily,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for BucketFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One point of an aggregated series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub key: String,
    pub value: f64,
}

/// An ordered aggregated series with rendering labels
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    /// Ordered (key, value) pairs; keys are unique
    pub points: Vec<SeriesPoint>,
    pub x_label: String,
    pub y_label: String,
    /// Human-readable description of the aggregation applied
    pub title: String,
}
