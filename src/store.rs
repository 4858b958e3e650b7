//! Index store seam.
//!
//! The core only builds query bodies and reads back hits; executing them is
//! the store's job. [`crate::elasticsearch::EsClient`] is the production
//! implementation.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::{CrossRefs, LocationRecord, LocationType};

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationHit {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// First sort value, when the query sorted by distance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub record: LocationRecord,
}

/// One completion option
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub text: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<LocationRecord>,
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Full-document upsert keyed by `record.id`
    async fn upsert(&self, record: &LocationRecord) -> Result<()>;

    /// Published documents of `location_type` carrying any of `xrefs`.
    ///
    /// Returns at most `limit` records; never queries when `xrefs` is empty.
    async fn find_by_xref(
        &self,
        location_type: LocationType,
        xrefs: &CrossRefs,
        limit: usize,
    ) -> Result<Vec<LocationRecord>>;

    /// Run a search body, hits in the store's order
    async fn search(&self, body: Value) -> Result<Vec<LocationHit>>;

    /// Run a completion body
    async fn suggest(&self, body: Value) -> Result<Vec<Suggestion>>;
}
