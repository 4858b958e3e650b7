//! In-memory collaborators for exercising the indexer and searcher without
//! external services.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use quattro::cache::{EnrichmentCache, GeonameEnrichment};
use quattro::indexer::StateAbbreviations;
use quattro::models::{CrossRefs, GeoPoint, LocationRecord, LocationType};
use quattro::source::{LocationSource, RawLocationRow};
use quattro::store::{LocationHit, LocationStore, Suggestion};
use quattro::{Error, Indexer, Result};

/// Index store keeping published documents in their wire form
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Value>>,
    pub xref_lookups: Mutex<Vec<(LocationType, CrossRefs)>>,
}

impl MemoryStore {
    pub fn insert(&self, record: &LocationRecord) {
        let doc = serde_json::to_value(record).unwrap();
        self.docs.lock().unwrap().insert(record.id.clone(), doc);
    }

    pub fn get(&self, id: &str) -> Option<LocationRecord> {
        let doc = self.docs.lock().unwrap().get(id).cloned()?;
        Some(serde_json::from_value(doc).unwrap())
    }

    pub fn raw(&self, id: &str) -> Option<Value> {
        self.docs.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn lookup_count(&self) -> usize {
        self.xref_lookups.lock().unwrap().len()
    }

    fn records(&self) -> Vec<LocationRecord> {
        self.docs
            .lock()
            .unwrap()
            .values()
            .map(|doc| serde_json::from_value(doc.clone()).unwrap())
            .collect()
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn upsert(&self, record: &LocationRecord) -> Result<()> {
        self.insert(record);
        Ok(())
    }

    async fn find_by_xref(
        &self,
        location_type: LocationType,
        xrefs: &CrossRefs,
        limit: usize,
    ) -> Result<Vec<LocationRecord>> {
        self.xref_lookups
            .lock()
            .unwrap()
            .push((location_type, *xrefs));
        Ok(self
            .records()
            .into_iter()
            .filter(|r| r.location_type == location_type)
            .filter(|r| xrefs.present().any(|(kind, id)| r.xrefs.get(kind) == Some(id)))
            .take(limit)
            .collect())
    }

    /// Understands the nearest-feature and containing-shape bodies.
    ///
    /// Nearest-feature hits ignore the radius filter on purpose so callers
    /// can be checked for trimming them.
    async fn search(&self, body: Value) -> Result<Vec<LocationHit>> {
        let filter = &body["query"]["bool"]["filter"];

        if let Some(shape) = filter["geo_shape"]["boundaries"]["shape"]["coordinates"].as_array() {
            let lon = shape[0].as_f64().unwrap();
            let lat = shape[1].as_f64().unwrap();
            return Ok(self
                .records()
                .into_iter()
                .filter(|r| r.boundaries.as_ref().is_some_and(|b| bbox_contains(b, lon, lat)))
                .map(|record| hit(record, Some(1.0), None))
                .collect());
        }

        if let Some(location_type) = filter[0]["term"]["location_type"].as_str() {
            let origin: GeoPoint = serde_json::from_value(
                filter[1]["geo_distance"]["center_point"].clone(),
            )
            .unwrap();
            let mut hits: Vec<LocationHit> = self
                .records()
                .into_iter()
                .filter(|r| r.location_type.as_str() == location_type)
                .filter_map(|record| {
                    let center = record.center_point?;
                    let distance = approx_distance_m(origin, center);
                    Some(hit(record, None, Some(distance)))
                })
                .collect();
            hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
            return Ok(hits);
        }

        Ok(Vec::new())
    }

    async fn suggest(&self, _body: Value) -> Result<Vec<Suggestion>> {
        Ok(Vec::new())
    }
}

fn hit(record: LocationRecord, score: Option<f64>, distance: Option<f64>) -> LocationHit {
    LocationHit {
        id: record.id.clone(),
        score,
        distance,
        record,
    }
}

/// Equirectangular approximation, good enough at city scale
fn approx_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let mean_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let dx = (b.lon - a.lon) * mean_lat.cos() * 111_320.0;
    let dy = (b.lat - a.lat) * 110_540.0;
    (dx * dx + dy * dy).sqrt()
}

/// Point-in-bounding-box of a GeoJSON polygon's outer ring
fn bbox_contains(geometry: &Value, lon: f64, lat: f64) -> bool {
    let Some(ring) = geometry["coordinates"][0].as_array() else {
        return false;
    };
    let points: Vec<(f64, f64)> = ring
        .iter()
        .filter_map(|p| Some((p[0].as_f64()?, p[1].as_f64()?)))
        .collect();
    if points.is_empty() {
        return false;
    }
    let min_lon = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_lon = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_lat = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_lat = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    (min_lon..=max_lon).contains(&lon) && (min_lat..=max_lat).contains(&lat)
}

/// GeoJSON rectangle as PostGIS would render it
pub fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> String {
    serde_json::json!({
        "type": "Polygon",
        "coordinates": [[
            [min_lon, min_lat],
            [max_lon, min_lat],
            [max_lon, max_lat],
            [min_lon, max_lat],
            [min_lon, min_lat]
        ]]
    })
    .to_string()
}

/// Relational source backed by a map of rows
#[derive(Default)]
pub struct MemorySource {
    rows: Mutex<HashMap<(LocationType, i64), RawLocationRow>>,
}

impl MemorySource {
    pub fn put(&self, location_type: LocationType, gid: i64, row: RawLocationRow) {
        self.rows.lock().unwrap().insert((location_type, gid), row);
    }
}

#[async_trait]
impl LocationSource for MemorySource {
    async fn fetch(
        &self,
        location_type: LocationType,
        gid: i64,
    ) -> Result<Option<RawLocationRow>> {
        Ok(self.rows.lock().unwrap().get(&(location_type, gid)).cloned())
    }

    async fn gids(&self, location_type: LocationType) -> Result<Vec<i64>> {
        let mut gids: Vec<i64> = self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(t, _)| *t == location_type)
            .map(|(_, gid)| *gid)
            .collect();
        gids.sort_unstable();
        Ok(gids)
    }
}

/// Enrichment cache backed by a map of blobs
#[derive(Default)]
pub struct MemoryCache {
    blobs: Mutex<HashMap<i64, GeonameEnrichment>>,
    pub lookups: Mutex<Vec<i64>>,
}

impl MemoryCache {
    pub fn put(&self, gn_id: i64, blob: GeonameEnrichment) {
        self.blobs.lock().unwrap().insert(gn_id, blob);
    }
}

#[async_trait]
impl EnrichmentCache for MemoryCache {
    async fn geoname(&self, gn_id: i64) -> Result<Option<GeonameEnrichment>> {
        self.lookups.lock().unwrap().push(gn_id);
        Ok(self.blobs.lock().unwrap().get(&gn_id).cloned())
    }
}

/// Cache whose backend is unreachable
pub struct DownCache;

#[async_trait]
impl EnrichmentCache for DownCache {
    async fn geoname(&self, _gn_id: i64) -> Result<Option<GeonameEnrichment>> {
        Err(Error::Cache(anyhow::anyhow!("connection refused")))
    }
}

pub struct Harness {
    pub source: Arc<MemorySource>,
    pub cache: Arc<MemoryCache>,
    pub store: Arc<MemoryStore>,
    pub indexer: Indexer,
}

impl Harness {
    pub fn new() -> Self {
        let source = Arc::new(MemorySource::default());
        let cache = Arc::new(MemoryCache::default());
        let store = Arc::new(MemoryStore::default());
        let indexer = Indexer::new(
            source.clone(),
            cache.clone(),
            store.clone(),
            Arc::new(StateAbbreviations::embedded().unwrap()),
        );
        Self {
            source,
            cache,
            store,
            indexer,
        }
    }
}

pub fn row(name: &str, gn_id: Option<&str>, woe_id: Option<&str>) -> RawLocationRow {
    RawLocationRow {
        gn_id: gn_id.map(str::to_string),
        woe_id: woe_id.map(str::to_string),
        name: Some(name.to_string()),
        ..Default::default()
    }
}
