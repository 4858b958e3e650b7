//! Reverse geocoding cascade.

use tracing::debug;

use super::{Searcher, DEFAULT_CLOSEST_RADIUS_M};
use crate::error::Result;
use crate::models::{LocationType, SHAPE_PRIORITY};
use crate::store::LocationHit;

/// Point-like features tried before polygon containment, in order
const POINT_CASCADE: [LocationType; 3] = [
    LocationType::Address,
    LocationType::Street,
    LocationType::Poi,
];

impl Searcher {
    /// Best single feature for a coordinate.
    ///
    /// The nearest address, street or poi within the default radius wins, in
    /// that order; otherwise the finest administrative shape containing the
    /// point. `None` when nothing matches.
    pub async fn reverse_geocode(&self, lon: f64, lat: f64) -> Result<Option<LocationHit>> {
        for location_type in POINT_CASCADE {
            let hits = self
                .closest(lon, lat, location_type, DEFAULT_CLOSEST_RADIUS_M)
                .await?;
            if let Some(hit) = hits.into_iter().next() {
                debug!("Reverse ({}, {}) -> {} {}", lon, lat, location_type, hit.id);
                return Ok(Some(hit));
            }
        }

        let shapes = self.encompassing_shapes(lon, lat).await?;
        let found = pick_encompassing(shapes);
        if found.is_none() {
            debug!("Reverse ({}, {}) matched nothing", lon, lat);
        }
        Ok(found)
    }
}

/// First shape in neighborhood → admin0 priority order
pub fn pick_encompassing(shapes: Vec<LocationHit>) -> Option<LocationHit> {
    SHAPE_PRIORITY.iter().find_map(|location_type| {
        shapes
            .iter()
            .find(|shape| shape.record.location_type == *location_type)
            .cloned()
    })
}
