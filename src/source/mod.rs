//! Relational source of raw shape rows.

mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::LocationType;

pub use postgres::PgSource;

/// One raw row as projected from a shape table.
///
/// Cross-reference ids are kept as text; normalization happens in the
/// indexer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLocationRow {
    pub gn_id: Option<String>,
    pub woe_id: Option<String>,
    /// WKT rendering of the geometry centroid
    pub centroid: Option<String>,
    /// GeoJSON rendering of the full geometry
    pub boundaries: Option<String>,
    pub name: Option<String>,
    pub abbr: Option<String>,
    /// Only projected for `admin1`
    pub country_code: Option<String>,
}

#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Row for `(location_type, gid)`, `None` when absent or the type has
    /// no table
    async fn fetch(
        &self,
        location_type: LocationType,
        gid: i64,
    ) -> Result<Option<RawLocationRow>>;

    /// All source ids of a type, ascending
    async fn gids(&self, location_type: LocationType) -> Result<Vec<i64>>;
}
