//! CKAN datastore client module
//!
//! Everything that talks to the CKAN HTTP API lives here.
//!
//! Structure:
//! - `client.rs`: datastore-search client and JSON envelope parsing

pub mod client;

// Re-exports for convenience
pub use client::{CkanClient, DatastoreQuery};
