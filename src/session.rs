//! Per-session application state
//!
//! `Session` is the explicit context object every operation goes through:
//! it owns the CKAN client, the memoized fetch cache, and the "current
//! Record Set" slot. One logical thread of control drives it — a single
//! query is in flight at a time, and the slot is only ever replaced
//! wholesale by a successful non-empty fetch.

use crate::chart::{
    aggregate_categorical, aggregate_time_series, BucketFrequency, ChartSeries, CombineStrategy,
    SortDirection,
};
use crate::ckan::{CkanClient, DatastoreQuery};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::table::{self, sniff, ColumnSummary};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use tracing::{debug, info};

/// Memoization key: the four query parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource_id: String,
    q: String,
    limit: u32,
    offset: u32,
}

impl From<&DatastoreQuery> for QueryKey {
    fn from(query: &DatastoreQuery) -> Self {
        QueryKey {
            resource_id: query.resource_id.clone(),
            q: query.q.clone(),
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// Outcome of one fetch action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A non-empty Record Set was stored as the current dataset
    Loaded { rows: usize, columns: usize },
    /// The query returned no rows; the current dataset was left untouched
    Empty,
}

/// Parameters for a categorical bar chart
#[derive(Debug, Clone, Copy)]
pub struct CategoricalChartRequest<'a> {
    /// Key column (categorical X axis)
    pub key_column: &'a str,
    /// Value column to combine; `None` means count-only
    pub value_column: Option<&'a str>,
    pub combine: CombineStrategy,
    /// Truncation cap, clamped to the configured Top-N range
    pub top_n: usize,
    pub direction: SortDirection,
}

/// Parameters for a time-series line chart
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesChartRequest<'a> {
    /// Date-like key column (X axis)
    pub key_column: &'a str,
    /// Value column to sum per bucket; `None` means count-only
    pub value_column: Option<&'a str>,
    pub frequency: BucketFrequency,
}

/// Explicit application state for one interactive session
pub struct Session {
    config: DashboardConfig,
    client: CkanClient,
    cache: HashMap<QueryKey, DataFrame>,
    current: Option<DataFrame>,
}

impl Session {
    /// Create a session against the configured endpoint
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let client = CkanClient::new(&config)?;
        Ok(Session {
            config,
            client,
            cache: HashMap::new(),
            current: None,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Query for a resource with no filter, at the configured default limit
    pub fn default_query(&self, resource_id: impl Into<String>) -> DatastoreQuery {
        DatastoreQuery::new(resource_id, self.config.default_limit)
    }

    /// Run one fetch action
    ///
    /// Validates the resource id, serves identical queries from the cache,
    /// and stores the normalized Record Set as the current dataset. An
    /// empty result reports `FetchOutcome::Empty` and leaves the current
    /// dataset exactly as it was.
    pub async fn fetch(&mut self, query: &DatastoreQuery) -> Result<FetchOutcome> {
        if query.resource_id.trim().is_empty() {
            return Err(DashboardError::Input("resource_id is required".to_string()));
        }

        let mut query = query.clone();
        query.limit = self.config.clamp_limit(query.limit);
        let key = QueryKey::from(&query);

        let frame = if let Some(hit) = self.cache.get(&key) {
            debug!(resource_id = %query.resource_id, "fetch cache hit");
            hit.clone()
        } else {
            debug!(resource_id = %query.resource_id, "fetch cache miss");
            let records = self.client.fetch_records(&query).await?;
            let frame = table::records_to_frame(&records)?;
            self.cache.insert(key, frame.clone());
            frame
        };

        Ok(self.absorb(frame))
    }

    /// Apply the slot-update rule for one fetched Record Set
    ///
    /// Split out of `fetch` so the empty-result guard is testable without
    /// a network.
    pub(crate) fn absorb(&mut self, frame: DataFrame) -> FetchOutcome {
        if frame.height() == 0 {
            info!("fetch returned no rows; keeping previous dataset");
            return FetchOutcome::Empty;
        }

        let outcome = FetchOutcome::Loaded {
            rows: frame.height(),
            columns: frame.width(),
        };
        info!(rows = frame.height(), columns = frame.width(), "dataset loaded");
        self.current = Some(frame);
        outcome
    }

    /// The current Record Set, if a fetch has succeeded
    pub fn current(&self) -> Option<&DataFrame> {
        self.current.as_ref()
    }

    fn require_current(&self) -> Result<&DataFrame> {
        self.current
            .as_ref()
            .ok_or_else(|| DashboardError::Input("no dataset loaded".to_string()))
    }

    /// First rows of the current dataset for a quick view
    ///
    /// `None` uses the configured preview size.
    pub fn preview(&self, rows: Option<usize>) -> Result<DataFrame> {
        let rows = rows.unwrap_or(self.config.preview_rows);
        Ok(table::preview(self.require_current()?, rows))
    }

    /// Per-column schema summary of the current dataset
    pub fn schema_summary(&self) -> Result<Vec<ColumnSummary>> {
        Ok(table::schema_summary(self.require_current()?))
    }

    /// Current dataset as UTF-8 CSV bytes with a header row
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        table::to_csv_bytes(self.require_current()?)
    }

    /// Candidate key columns (text columns), sorted
    pub fn categorical_candidates(&self) -> Result<Vec<String>> {
        Ok(sniff::categorical_candidates(self.require_current()?))
    }

    /// Candidate value columns for a chosen key column
    ///
    /// Recomputed per call: candidacy depends on which column is excluded.
    pub fn numeric_candidates(&self, key_column: &str) -> Result<Vec<String>> {
        sniff::numeric_candidates(self.require_current()?, key_column)
    }

    /// Whether a column parses as dates in every non-null cell
    pub fn is_date_column(&self, column: &str) -> Result<bool> {
        let df = self.require_current()?;
        sniff::is_date_like(df.column(column)?.as_materialized_series())
    }

    /// Build a categorical bar-chart series from the current dataset
    pub fn categorical_chart(
        &self,
        request: &CategoricalChartRequest<'_>,
    ) -> Result<Option<ChartSeries>> {
        let df = self.require_current()?;
        let top_n = self.config.clamp_top_n(request.top_n);
        aggregate_categorical(
            df,
            request.key_column,
            request.value_column,
            request.combine,
            top_n,
            request.direction,
        )
    }

    /// Build a time-series line-chart series from the current dataset
    pub fn time_series_chart(
        &self,
        request: &TimeSeriesChartRequest<'_>,
    ) -> Result<Option<ChartSeries>> {
        let df = self.require_current()?;
        aggregate_time_series(
            df,
            request.key_column,
            request.value_column,
            request.frequency,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn session() -> Session {
        Session::new(DashboardConfig::default()).unwrap()
    }

    fn loaded_session() -> Session {
        let mut s = session();
        let df = df!(
            "region" => &["RM", "RM", "V"],
            "monto" => &["$10", "$20", "$5"],
            "fecha" => &["2023-01-15", "2023-01-28", "2023-02-02"]
        )
        .unwrap();
        assert!(matches!(s.absorb(df), FetchOutcome::Loaded { .. }));
        s
    }

    #[tokio::test]
    async fn test_fetch_requires_resource_id() {
        let mut s = session();
        let query = DatastoreQuery::new("   ", 100);
        let err = s.fetch(&query).await.unwrap_err();
        assert!(matches!(err, DashboardError::Input(_)));
        assert!(s.current().is_none());
    }

    #[test]
    fn test_empty_fetch_keeps_previous_dataset() {
        let mut s = loaded_session();
        let before_height = s.current().unwrap().height();

        let outcome = s.absorb(DataFrame::empty());
        assert_eq!(outcome, FetchOutcome::Empty);
        assert_eq!(s.current().unwrap().height(), before_height);
    }

    #[test]
    fn test_loaded_fetch_replaces_dataset_wholesale() {
        let mut s = loaded_session();
        let df = df!("x" => &[1i64]).unwrap();

        let outcome = s.absorb(df);
        assert_eq!(outcome, FetchOutcome::Loaded { rows: 1, columns: 1 });
        assert_eq!(s.current().unwrap().width(), 1);
    }

    #[test]
    fn test_query_key_identity() {
        let a = DatastoreQuery {
            resource_id: "r".into(),
            q: "f".into(),
            limit: 100,
            offset: 0,
        };
        let mut b = a.clone();
        assert_eq!(QueryKey::from(&a), QueryKey::from(&b));

        b.offset = 100;
        assert_ne!(QueryKey::from(&a), QueryKey::from(&b));
    }

    #[test]
    fn test_accessors_require_loaded_dataset() {
        let s = session();
        assert!(matches!(
            s.schema_summary().unwrap_err(),
            DashboardError::Input(_)
        ));
        assert!(matches!(
            s.export_csv().unwrap_err(),
            DashboardError::Input(_)
        ));
        assert!(matches!(
            s.preview(Some(5)).unwrap_err(),
            DashboardError::Input(_)
        ));
    }

    #[test]
    fn test_default_query_uses_configured_limit() {
        let s = session();
        let query = s.default_query("abc");
        assert_eq!(query.limit, s.config().default_limit);
        assert!(query.q.is_empty());
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_candidates_and_date_detection() {
        let s = loaded_session();
        assert_eq!(
            s.categorical_candidates().unwrap(),
            vec!["fecha", "monto", "region"]
        );
        assert_eq!(s.numeric_candidates("region").unwrap(), vec!["monto"]);
        assert!(s.is_date_column("fecha").unwrap());
        assert!(!s.is_date_column("region").unwrap());
    }

    #[test]
    fn test_categorical_chart_clamps_top_n() {
        let s = loaded_session();
        let series = s
            .categorical_chart(&CategoricalChartRequest {
                key_column: "region",
                value_column: Some("monto"),
                combine: CombineStrategy::Sum,
                top_n: 1, // clamped up to the configured minimum of 5
                direction: SortDirection::Descending,
            })
            .unwrap()
            .unwrap();

        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].key, "RM");
        assert_eq!(series.points[0].value, 30.0);
    }

    #[test]
    fn test_time_series_chart() {
        let s = loaded_session();
        let series = s
            .time_series_chart(&TimeSeriesChartRequest {
                key_column: "fecha",
                value_column: None,
                frequency: BucketFrequency::Monthly,
            })
            .unwrap()
            .unwrap();

        let keys: Vec<&str> = series.points.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["2023-01", "2023-02"]);
        let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 1.0]);
    }

    #[test]
    fn test_preview_and_export() {
        let s = loaded_session();
        assert_eq!(s.preview(Some(2)).unwrap().height(), 2);
        // None falls back to the configured preview size (10 > 3 rows)
        assert_eq!(s.preview(None).unwrap().height(), 3);

        let csv = String::from_utf8(s.export_csv().unwrap()).unwrap();
        assert!(csv.starts_with("region,monto,fecha"));
        assert_eq!(csv.lines().count(), 4);
    }
}
