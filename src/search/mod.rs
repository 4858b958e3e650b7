//! Query path: text search, suggestions, nearest features and reverse
//! geocoding against the index store.

pub mod query;
mod reverse;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{GeoPoint, LocationType, Viewbox};
use crate::store::{LocationHit, LocationStore, Suggestion};

pub use query::DEFAULT_CLOSEST_RADIUS_M;
pub use reverse::pick_encompassing;

/// Read-only query executor
#[derive(Clone)]
pub struct Searcher {
    store: Arc<dyn LocationStore>,
}

impl Searcher {
    pub fn new(store: Arc<dyn LocationStore>) -> Self {
        Self { store }
    }

    /// Full-text search.
    ///
    /// `viewbox` is `"minLon,maxLat,maxLon,minLat"` and `center` is
    /// `"lon,lat"`; strings that do not parse are ignored.
    pub async fn search(
        &self,
        term: &str,
        viewbox: Option<&str>,
        center: Option<&str>,
        size: usize,
    ) -> Result<Vec<LocationHit>> {
        let viewbox = viewbox.and_then(|s| {
            s.parse::<Viewbox>()
                .map_err(|e| warn!("Ignoring viewbox: {}", e))
                .ok()
        });
        let center = center.and_then(|s| {
            s.parse::<GeoPoint>()
                .map_err(|e| warn!("Ignoring center: {}", e))
                .ok()
        });

        let body = query::search(term, viewbox.as_ref(), center, size);
        debug!("Search query: {}", body);
        self.store.search(body).await
    }

    pub async fn suggest(&self, prefix: &str, size: usize) -> Result<Vec<Suggestion>> {
        self.store.suggest(query::suggest(prefix, size)).await
    }

    /// Features of `location_type` within `radius_m` meters, nearest first.
    ///
    /// Hits reported farther than the radius are dropped.
    pub async fn closest(
        &self,
        lon: f64,
        lat: f64,
        location_type: LocationType,
        radius_m: f64,
    ) -> Result<Vec<LocationHit>> {
        let hits = self
            .store
            .search(query::closest(lon, lat, location_type, radius_m))
            .await?;

        Ok(hits
            .into_iter()
            .filter(|hit| hit.distance.map_or(true, |d| d <= radius_m))
            .collect())
    }

    /// All documents whose boundaries contain the point
    pub async fn encompassing_shapes(&self, lon: f64, lat: f64) -> Result<Vec<LocationHit>> {
        self.store
            .search(query::encompassing_shapes(lon, lat))
            .await
    }
}
