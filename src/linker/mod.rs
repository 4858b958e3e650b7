//! Record linker.
//!
//! A [`LocationSet`] gathers the cross-reference ids under which one entity
//! is known, resolves them to a single logical entity, lets the caller
//! populate a draft record, copies name data down from already-published
//! ancestors, and finally publishes the drafts.
//!
//! ```text
//! begin -> register* -> resolve -> build -> link_ancestors -> finalize
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{CrossRefs, LocationRecord, LocationType, XrefKind};
use crate::store::LocationStore;

/// Outcome of resolving the cross references registered for one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub xrefs: CrossRefs,
    /// Id of the document already published for this entity, if exactly one
    /// was found
    pub previous_id: Option<String>,
}

/// Linking context for one indexing task
pub struct LocationSet {
    store: Arc<dyn LocationStore>,
    pending: BTreeMap<LocationType, CrossRefs>,
    resolved: BTreeMap<LocationType, Resolution>,
    drafts: Vec<LocationRecord>,
}

impl LocationSet {
    /// Start a new batch
    pub fn begin(store: Arc<dyn LocationStore>) -> Self {
        Self {
            store,
            pending: BTreeMap::new(),
            resolved: BTreeMap::new(),
            drafts: Vec::new(),
        }
    }

    /// Record that the entity of `location_type` is also known as `id`.
    ///
    /// `None` (already normalized away) is a no-op, as is registering against
    /// a type that was already resolved.
    pub fn register(&mut self, location_type: LocationType, kind: XrefKind, id: Option<i64>) {
        let Some(id) = id.filter(|id| *id > 0) else {
            return;
        };
        if self.resolved.contains_key(&location_type) {
            warn!(
                "Ignoring {}.{}={} registered after resolution",
                location_type,
                kind.field(),
                id
            );
            return;
        }
        self.pending.entry(location_type).or_default().set(kind, id);
    }

    /// Close registration for `location_type` and find the entity it names.
    ///
    /// With no cross references there is nothing to look up. When more than
    /// one published document matches, no previous id is adopted and the
    /// caller's deterministic id wins.
    pub async fn resolve(&mut self, location_type: LocationType) -> Result<&Resolution> {
        let xrefs = self.pending.remove(&location_type).unwrap_or_default();

        let previous_id = if xrefs.is_empty() {
            None
        } else {
            let existing = self.store.find_by_xref(location_type, &xrefs, 2).await?;
            let mut ids: Vec<String> = existing.into_iter().map(|r| r.id).collect();
            ids.sort();
            ids.dedup();
            match ids.len() {
                0 => None,
                1 => ids.pop(),
                _ => {
                    warn!(
                        "Cross references {:?} for {} match several documents ({}); not merging",
                        xrefs,
                        location_type,
                        ids.join(", ")
                    );
                    None
                }
            }
        };

        debug!(
            "Resolved {} {:?} -> previous id {:?}",
            location_type, xrefs, previous_id
        );

        let resolution = self
            .resolved
            .entry(location_type)
            .or_insert(Resolution { xrefs, previous_id });
        Ok(&*resolution)
    }

    /// Create the draft for a resolved type and hand it to `populate`
    /// together with the previously published id, if any.
    ///
    /// The populate step must leave the draft with an id.
    pub fn build<F>(&mut self, location_type: LocationType, populate: F) -> Result<()>
    where
        F: FnOnce(Option<&str>, &mut LocationRecord),
    {
        let resolution = match self.resolved.get(&location_type) {
            Some(resolution) => resolution.clone(),
            None => Resolution {
                xrefs: CrossRefs::default(),
                previous_id: None,
            },
        };

        let mut draft = LocationRecord::draft(location_type, resolution.xrefs);
        populate(resolution.previous_id.as_deref(), &mut draft);

        if draft.id.is_empty() {
            return Err(Error::Unidentified(location_type));
        }
        draft.location_type = location_type;
        self.drafts.push(draft);
        Ok(())
    }

    /// Copy name data down from published ancestors into every draft.
    ///
    /// `ancestor_types` is walked in the given order (normally from the
    /// immediate parent up to `admin0`); types not strictly coarser than a
    /// draft are skipped for it. A miss leaves that level absent.
    pub async fn link_ancestors(&mut self, ancestor_types: &[LocationType]) -> Result<()> {
        let store = Arc::clone(&self.store);
        for draft in &mut self.drafts {
            link_draft(store.as_ref(), ancestor_types, draft).await?;
        }
        Ok(())
    }

    /// Publish every draft and return what was written
    pub async fn finalize(self) -> Result<Vec<LocationRecord>> {
        for draft in &self.drafts {
            self.store.upsert(draft).await?;
            debug!("Published {}", draft.id);
        }
        Ok(self.drafts)
    }
}

async fn link_draft(
    store: &dyn LocationStore,
    ancestor_types: &[LocationType],
    draft: &mut LocationRecord,
) -> Result<()> {
    if draft.xrefs.is_empty() {
        debug!("{} has no cross references; skipping ancestor lookup", draft.id);
        return Ok(());
    }

    for &ancestor_type in ancestor_types {
        if !ancestor_type.is_coarser_than(draft.location_type) {
            continue;
        }

        let found = store.find_by_xref(ancestor_type, &draft.xrefs, 1).await?;
        match found.first() {
            Some(ancestor) if ancestor.location_type == ancestor_type => {
                draft.adopt_ancestor(ancestor);
                debug!("Linked {} -> {} {}", draft.id, ancestor_type, ancestor.id);
            }
            _ => debug!("No published {} for {}", ancestor_type, draft.id),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LocationHit, Suggestion};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        published: Mutex<Vec<LocationRecord>>,
        lookups: Mutex<Vec<LocationType>>,
        existing: Vec<LocationRecord>,
    }

    #[async_trait]
    impl LocationStore for RecordingStore {
        async fn upsert(&self, record: &LocationRecord) -> Result<()> {
            self.published.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn find_by_xref(
            &self,
            location_type: LocationType,
            xrefs: &CrossRefs,
            limit: usize,
        ) -> Result<Vec<LocationRecord>> {
            self.lookups.lock().unwrap().push(location_type);
            Ok(self
                .existing
                .iter()
                .filter(|r| r.location_type == location_type)
                .filter(|r| xrefs.present().any(|(kind, id)| r.xrefs.get(kind) == Some(id)))
                .take(limit)
                .cloned()
                .collect())
        }

        async fn search(&self, _body: serde_json::Value) -> Result<Vec<LocationHit>> {
            Ok(Vec::new())
        }

        async fn suggest(&self, _body: serde_json::Value) -> Result<Vec<Suggestion>> {
            Ok(Vec::new())
        }
    }

    fn published(
        location_type: LocationType,
        id: &str,
        gn_id: i64,
        name: &str,
    ) -> LocationRecord {
        let mut record = LocationRecord::draft(
            location_type,
            CrossRefs {
                gn_id: Some(gn_id),
                woe_id: None,
            },
        );
        record.id = id.to_string();
        record.name = name.to_string();
        record
    }

    #[tokio::test]
    async fn invalid_ids_are_not_registered() {
        let store = Arc::new(RecordingStore::default());
        let mut set = LocationSet::begin(store.clone());
        set.register(LocationType::Locality, XrefKind::GeonamesId, None);
        set.register(LocationType::Locality, XrefKind::WoeId, Some(0));
        set.register(LocationType::Locality, XrefKind::WoeId, Some(-3));

        let resolution = set.resolve(LocationType::Locality).await.unwrap();
        assert!(resolution.xrefs.is_empty());
        assert!(resolution.previous_id.is_none());
        assert!(store.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolve_adopts_single_previous_document() {
        let store = Arc::new(RecordingStore {
            existing: vec![published(LocationType::Locality, "qs:locality:9", 5, "Oakland")],
            ..Default::default()
        });
        let mut set = LocationSet::begin(store);
        set.register(LocationType::Locality, XrefKind::GeonamesId, Some(5));
        let resolution = set.resolve(LocationType::Locality).await.unwrap();
        assert_eq!(resolution.previous_id.as_deref(), Some("qs:locality:9"));
    }

    #[tokio::test]
    async fn conflicting_previous_documents_are_not_merged() {
        let store = Arc::new(RecordingStore {
            existing: vec![
                published(LocationType::Locality, "qs:locality:1", 5, "A"),
                published(LocationType::Locality, "qs:locality:2", 5, "B"),
            ],
            ..Default::default()
        });
        let mut set = LocationSet::begin(store);
        set.register(LocationType::Locality, XrefKind::GeonamesId, Some(5));
        let resolution = set.resolve(LocationType::Locality).await.unwrap();
        assert!(resolution.previous_id.is_none());
    }

    #[tokio::test]
    async fn build_requires_an_id() {
        let store = Arc::new(RecordingStore::default());
        let mut set = LocationSet::begin(store);
        set.resolve(LocationType::Admin2).await.unwrap();
        let err = set.build(LocationType::Admin2, |_, _| {}).unwrap_err();
        assert!(matches!(err, Error::Unidentified(LocationType::Admin2)));
    }

    #[tokio::test]
    async fn links_only_coarser_ancestors_and_tolerates_misses() {
        let store = Arc::new(RecordingStore {
            existing: vec![
                published(LocationType::Admin0, "qs:admin0:1", 7, "Monaco"),
                published(LocationType::Locality, "qs:locality:4", 7, "Monaco-Ville"),
            ],
            ..Default::default()
        });
        let mut set = LocationSet::begin(store.clone());
        set.register(LocationType::Admin1, XrefKind::GeonamesId, Some(7));
        set.resolve(LocationType::Admin1).await.unwrap();
        set.build(LocationType::Admin1, |previous, draft| {
            draft.id = previous.unwrap_or("qs:admin1:2").to_string();
            draft.name = "Monaco".to_string();
        })
        .unwrap();

        set.link_ancestors(&[LocationType::Locality, LocationType::Admin0])
            .await
            .unwrap();

        let records = set.finalize().await.unwrap();
        let record = &records[0];
        assert_eq!(record.id, "qs:admin1:2");
        assert_eq!(
            record.ancestor_refs.keys().copied().collect::<Vec<_>>(),
            vec![LocationType::Admin0]
        );
        assert_eq!(
            record.ancestors[&LocationType::Admin0].name.as_deref(),
            Some("Monaco")
        );
        assert_eq!(store.published.lock().unwrap().len(), 1);
        // admin1 resolution + admin0 lookup; the finer locality was never queried
        assert_eq!(
            *store.lookups.lock().unwrap(),
            vec![LocationType::Admin1, LocationType::Admin0]
        );
    }
}
