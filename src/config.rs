//! Dashboard configuration
//!
//! Configuration is a plain value constructed by the caller; the core reads
//! no environment variables. Defaults target the datos.gob.cl CKAN portal,
//! and `with_endpoint` points the same pipeline at any other CKAN instance.

use std::time::Duration;

/// Default CKAN datastore-search action URL (datos.gob.cl)
pub const DEFAULT_ENDPOINT: &str = "https://datos.gob.cl/api/3/action/datastore_search";

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Datastore-search endpoint URL
    pub endpoint: String,

    /// Fixed timeout budget for one fetch
    pub request_timeout: Duration,

    /// Row limit applied when a query does not specify one
    pub default_limit: u32,

    /// Allowed row-limit range; out-of-range limits are clamped
    pub limit_bounds: (u32, u32),

    /// Default number of rows shown in a preview
    pub preview_rows: usize,

    /// Allowed Top-N range for categorical charts; out-of-range N is clamped
    pub top_n_bounds: (usize, usize),
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(25),
            default_limit: 100,
            limit_bounds: (10, 5000),
            preview_rows: 10,
            top_n_bounds: (5, 50),
        }
    }
}

impl DashboardConfig {
    /// Default configuration against a different CKAN portal
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        DashboardConfig {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Clamp a requested row limit into the configured range
    pub fn clamp_limit(&self, limit: u32) -> u32 {
        limit.clamp(self.limit_bounds.0, self.limit_bounds.1)
    }

    /// Clamp a requested Top-N into the configured range
    pub fn clamp_top_n(&self, top_n: usize) -> usize {
        top_n.clamp(self.top_n_bounds.0, self.top_n_bounds.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout, Duration::from_secs(25));
        assert_eq!(config.default_limit, 100);
    }

    #[test]
    fn test_clamping() {
        let config = DashboardConfig::default();
        assert_eq!(config.clamp_limit(1), 10);
        assert_eq!(config.clamp_limit(500), 500);
        assert_eq!(config.clamp_limit(100_000), 5000);
        assert_eq!(config.clamp_top_n(1), 5);
        assert_eq!(config.clamp_top_n(10), 10);
        assert_eq!(config.clamp_top_n(200), 50);
    }

    #[test]
    fn test_endpoint_override() {
        let config =
            DashboardConfig::with_endpoint("https://demo.ckan.org/api/3/action/datastore_search");
        assert!(config.endpoint.starts_with("https://demo.ckan.org"));
        assert_eq!(config.default_limit, 100);
    }
}
