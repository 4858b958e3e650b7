//! Indexing task: one `(location type, source id)` unit of work.

mod states;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{EnrichmentCache, GeonameEnrichment};
use crate::error::Result;
use crate::linker::LocationSet;
use crate::models::{normalize_xref, GeoPoint, LocationRecord, LocationType, XrefKind};
use crate::source::{LocationSource, RawLocationRow};
use crate::store::LocationStore;

pub use states::StateAbbreviations;

/// Country whose `admin1` rows get abbreviations from the state table
const US_COUNTRY_CODE: &str = "US";

/// Handles needed by indexing tasks. Cheap to clone and share between
/// concurrently running tasks.
#[derive(Clone)]
pub struct Indexer {
    source: Arc<dyn LocationSource>,
    cache: Arc<dyn EnrichmentCache>,
    store: Arc<dyn LocationStore>,
    states: Arc<StateAbbreviations>,
}

impl Indexer {
    pub fn new(
        source: Arc<dyn LocationSource>,
        cache: Arc<dyn EnrichmentCache>,
        store: Arc<dyn LocationStore>,
        states: Arc<StateAbbreviations>,
    ) -> Self {
        Self {
            source,
            cache,
            store,
            states,
        }
    }

    /// Build and publish the canonical document for one source row.
    ///
    /// Returns the published record, or `None` when there is no such row.
    /// Errors are transport failures only.
    pub async fn index(
        &self,
        location_type: LocationType,
        gid: i64,
    ) -> Result<Option<LocationRecord>> {
        let Some(row) = self.source.fetch(location_type, gid).await? else {
            warn!("No {} row with gid {}", location_type, gid);
            return Ok(None);
        };

        let gn_id = normalize_xref(row.gn_id.as_deref());
        let woe_id = normalize_xref(row.woe_id.as_deref());

        let enrichment = match gn_id {
            Some(gn_id) => {
                let found = self.cache.geoname(gn_id).await?;
                if found.is_none() {
                    debug!("No geoname enrichment for {}", gn_id);
                }
                found
            }
            None => None,
        };

        let mut set = LocationSet::begin(Arc::clone(&self.store));
        set.register(location_type, XrefKind::GeonamesId, gn_id);
        set.register(location_type, XrefKind::WoeId, woe_id);
        set.resolve(location_type).await?;

        let states = self.states.as_ref();
        set.build(location_type, |previous_id, draft| {
            draft.id = choose_id(location_type, gid, previous_id);
            populate(draft, &row, enrichment.as_ref(), states);
        })?;

        set.link_ancestors(&location_type.ancestors()).await?;

        let record = set.finalize().await?.pop();
        if let Some(record) = &record {
            info!(
                "Indexed {} ({} ancestors linked)",
                record.id,
                record.ancestor_refs.len()
            );
        }
        Ok(record)
    }
}

/// Id to publish under: a previously published id is reused unless it is
/// another source row's deterministic id.
pub fn choose_id(location_type: LocationType, gid: i64, previous_id: Option<&str>) -> String {
    let own_id = LocationRecord::default_id(location_type, gid);
    match previous_id {
        Some(previous) => match LocationRecord::default_id_gid(location_type, previous) {
            Some(other) if other != gid => {
                warn!(
                    "{} shares cross references with {}; not merging",
                    own_id, previous
                );
                own_id
            }
            _ => previous.to_string(),
        },
        None => own_id,
    }
}

/// Fill a draft's intrinsic fields from its row, enrichment blob and the
/// state table. The draft's id and type are already set.
pub fn populate(
    draft: &mut LocationRecord,
    row: &RawLocationRow,
    enrichment: Option<&GeonameEnrichment>,
    states: &StateAbbreviations,
) {
    let location_type = draft.location_type;

    draft.name = row.name.clone().unwrap_or_default();
    if location_type.abbr_column().is_some() {
        draft.abbr = row.abbr.clone();
    }
    draft.center_point = row.centroid.as_deref().and_then(GeoPoint::from_wkt);
    draft.boundaries = row.boundaries.as_deref().and_then(|geojson| {
        serde_json::from_str(geojson)
            .map_err(|e| warn!("Discarding malformed boundaries for {}: {}", draft.id, e))
            .ok()
    });

    if let Some(enrichment) = enrichment {
        if let Some(name) = &enrichment.name {
            draft.name = name.clone();
        }
        draft.alternate_names = enrichment.alternate_names.clone();
        draft.population = enrichment.population;
    }

    // Looked up after enrichment, so the enriched name is the one matched
    if location_type == LocationType::Admin1
        && row.country_code.as_deref() == Some(US_COUNTRY_CODE)
    {
        draft.abbr = states.abbreviation(&draft.name).map(str::to_string);
    }
}
