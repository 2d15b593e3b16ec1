use thiserror::Error;

/// Errors that can occur while fetching or aggregating a dataset
#[derive(Debug, Error)]
pub enum DashboardError {
    /// HTTP transport failure or non-2xx response from the datastore API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Input validation failure (missing resource id, no dataset loaded, ...)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Polars error while building or reading a Record Set
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for DashboardError {
    fn from(s: String) -> Self {
        DashboardError::Other(s)
    }
}

/// Type alias for Results using DashboardError
pub type Result<T> = std::result::Result<T, DashboardError>;
