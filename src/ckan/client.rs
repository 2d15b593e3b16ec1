//! CKAN datastore-search client
//!
//! One fetch is one GET against the configured datastore-search action URL.
//! Any transport failure or non-2xx status fails the whole operation; there
//! is no retry and no partial result. A response whose `result.records` path
//! is absent or empty is a valid outcome and yields an empty record list.

use crate::config::DashboardConfig;
use crate::error::Result;
use serde_json::{Map, Value};
use tracing::debug;

/// Query parameters for one datastore-search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatastoreQuery {
    /// CKAN resource id (required, from the dataset's API tab)
    pub resource_id: String,

    /// Free-text filter; empty means "no filter" and the parameter is omitted
    pub q: String,

    /// Row limit
    pub limit: u32,

    /// Row offset
    pub offset: u32,
}

impl DatastoreQuery {
    /// Query for a resource with no filter at the given limit and offset zero
    pub fn new(resource_id: impl Into<String>, limit: u32) -> Self {
        DatastoreQuery {
            resource_id: resource_id.into(),
            q: String::new(),
            limit,
            offset: 0,
        }
    }
}

/// HTTP client for the CKAN datastore-search API
pub struct CkanClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CkanClient {
    /// Create a client with the configured endpoint and timeout budget
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(CkanClient {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Fetch the row records for one query
    ///
    /// Returns the raw JSON row objects; the caller turns them into a
    /// Record Set. An absent or empty `result.records` path yields an
    /// empty vector, not an error.
    pub async fn fetch_records(&self, query: &DatastoreQuery) -> Result<Vec<Map<String, Value>>> {
        let mut params: Vec<(&str, String)> = vec![
            ("resource_id", query.resource_id.clone()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if !query.q.is_empty() {
            params.push(("q", query.q.clone()));
        }

        debug!(
            resource_id = %query.resource_id,
            limit = query.limit,
            offset = query.offset,
            "datastore search"
        );

        let response = self
            .http
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        let payload: Value = response.json().await?;
        Ok(extract_records(&payload))
    }
}

/// Pull the row records out of a datastore-search response envelope
///
/// The records live at `result.records` as an array of objects. Anything
/// else (missing path, wrong type, non-object rows) degrades to an empty
/// or filtered list rather than an error.
pub(crate) fn extract_records(payload: &Value) -> Vec<Map<String, Value>> {
    payload
        .get("result")
        .and_then(|result| result.get("records"))
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(Value::as_object).cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_records_from_envelope() {
        let payload = json!({
            "success": true,
            "result": {
                "resource_id": "abc",
                "records": [
                    {"region": "RM", "total": 10},
                    {"region": "V", "total": 5}
                ]
            }
        });

        let records = extract_records(&payload);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["region"], json!("RM"));
        assert_eq!(records[1]["total"], json!(5));
    }

    #[test]
    fn test_extract_records_missing_path_is_empty() {
        assert!(extract_records(&json!({})).is_empty());
        assert!(extract_records(&json!({"result": {}})).is_empty());
        assert!(extract_records(&json!({"result": {"records": []}})).is_empty());
        assert!(extract_records(&json!({"result": {"records": "oops"}})).is_empty());
    }

    #[test]
    fn test_extract_records_skips_non_object_rows() {
        let payload = json!({
            "result": {"records": [{"a": 1}, 42, "row", {"a": 2}]}
        });

        let records = extract_records(&payload);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_query_construction() {
        let query = DatastoreQuery::new("3f862478", 500);
        assert_eq!(query.resource_id, "3f862478");
        assert!(query.q.is_empty());
        assert_eq!(query.limit, 500);
        assert_eq!(query.offset, 0);
    }
}
