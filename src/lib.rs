//! CKAN Datastore Charts
//!
//! This library implements the data side of a dataset dashboard: it fetches a
//! resource from a CKAN datastore-search API, normalizes the result into a
//! tabular Record Set, sniffs column types, and produces chart-ready series
//! for a presentation layer to render.
//!
//! Module organization:
//! - `ckan`: CKAN datastore-search HTTP client
//! - `table`: Record Set construction, column normalization, schema summary, CSV export
//! - `chart`: categorical and date-bucketed aggregation
//! - `session`: explicit per-session state (client, fetch cache, current Record Set)
//! - `config`: dashboard configuration

pub mod chart;
pub mod ckan;
pub mod config;
pub mod error;
pub mod session;
pub mod table;

pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use session::{FetchOutcome, Session};
