//! Canonical location record and its published document form.

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::{GeoPoint, LocationType};

/// Kind of external identifier a record can be joined on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XrefKind {
    /// Geonames id
    GeonamesId,
    /// Yahoo WOE id
    WoeId,
}

impl XrefKind {
    pub fn field(&self) -> &'static str {
        match self {
            XrefKind::GeonamesId => "gn_id",
            XrefKind::WoeId => "woe_id",
        }
    }
}

/// Positive-or-absent rule for raw cross-reference values.
///
/// Takes the leading integer of the text (so `"42.0"` is 42); zero,
/// negative, empty and non-numeric values are absent.
pub fn normalize_xref(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let end = raw
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    raw[..end].parse::<i64>().ok().filter(|n| *n > 0)
}

/// Cross-reference ids known for one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossRefs {
    pub gn_id: Option<i64>,
    pub woe_id: Option<i64>,
}

impl CrossRefs {
    pub fn get(&self, kind: XrefKind) -> Option<i64> {
        match kind {
            XrefKind::GeonamesId => self.gn_id,
            XrefKind::WoeId => self.woe_id,
        }
    }

    pub fn set(&mut self, kind: XrefKind, id: i64) {
        match kind {
            XrefKind::GeonamesId => self.gn_id = Some(id),
            XrefKind::WoeId => self.woe_id = Some(id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gn_id.is_none() && self.woe_id.is_none()
    }

    /// Present ids with their kind
    pub fn present(&self) -> impl Iterator<Item = (XrefKind, i64)> + '_ {
        [XrefKind::GeonamesId, XrefKind::WoeId]
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|id| (kind, id)))
    }
}

/// Name data copied down from one hierarchy level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelFields {
    pub name: Option<String>,
    pub abbr: Option<String>,
    pub alternate_names: Vec<String>,
}

/// The canonical document for one entity at one location type.
///
/// `ancestor_refs` and `ancestors` only ever hold types strictly coarser
/// than `location_type`. The record's own level is added when it is
/// serialized (`refs[type] = id`, `{type}_name`, ...) so descendants can copy
/// it, and dropped again when a document is read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "LocationDocument", from = "LocationDocument")]
pub struct LocationRecord {
    pub id: String,
    pub location_type: LocationType,
    pub xrefs: CrossRefs,
    pub name: String,
    pub abbr: Option<String>,
    pub alternate_names: Vec<String>,
    pub population: i64,
    pub center_point: Option<GeoPoint>,
    /// GeoJSON boundary geometry
    pub boundaries: Option<serde_json::Value>,
    pub ancestor_refs: BTreeMap<LocationType, String>,
    pub ancestors: BTreeMap<LocationType, LevelFields>,
}

impl LocationRecord {
    /// Deterministic id for a source row
    pub fn default_id(location_type: LocationType, gid: i64) -> String {
        format!("qs:{}:{}", location_type, gid)
    }

    /// Source gid encoded in a deterministic id of `location_type`, if `id`
    /// is one
    pub fn default_id_gid(location_type: LocationType, id: &str) -> Option<i64> {
        id.strip_prefix("qs:")?
            .strip_prefix(location_type.as_str())?
            .strip_prefix(':')?
            .parse()
            .ok()
    }

    /// Empty draft of the given type
    pub fn draft(location_type: LocationType, xrefs: CrossRefs) -> Self {
        Self {
            id: String::new(),
            location_type,
            xrefs,
            name: String::new(),
            abbr: None,
            alternate_names: Vec::new(),
            population: 0,
            center_point: None,
            boundaries: None,
            ancestor_refs: BTreeMap::new(),
            ancestors: BTreeMap::new(),
        }
    }

    /// This record's own name data, as descendants see it
    pub fn level_fields(&self) -> LevelFields {
        LevelFields {
            name: Some(self.name.clone()),
            abbr: self.abbr.clone(),
            alternate_names: self.alternate_names.clone(),
        }
    }

    /// Copy an ancestor's name data and reference under its type.
    ///
    /// Returns `false` (and changes nothing) unless the ancestor is strictly
    /// coarser than this record.
    pub fn adopt_ancestor(&mut self, ancestor: &LocationRecord) -> bool {
        if !ancestor.location_type.is_coarser_than(self.location_type) {
            return false;
        }
        self.ancestor_refs
            .insert(ancestor.location_type, ancestor.id.clone());
        self.ancestors
            .insert(ancestor.location_type, ancestor.level_fields());
        true
    }

    /// Completion inputs: name then alternate names, first occurrence kept
    pub fn suggest_inputs(&self) -> Vec<String> {
        let mut inputs: Vec<String> = Vec::with_capacity(self.alternate_names.len() + 1);
        for candidate in std::iter::once(&self.name).chain(self.alternate_names.iter()) {
            if !candidate.is_empty() && !inputs.contains(candidate) {
                inputs.push(candidate.clone());
            }
        }
        inputs
    }
}

/// Completion suggester input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggest {
    pub input: Vec<String>,
    #[serde(default)]
    pub weight: u32,
}

/// Wire form of [`LocationRecord`] as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDocument {
    pub id: String,
    pub location_type: LocationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gn_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub woe_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbr: Option<String>,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    #[serde(default)]
    pub population: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_point: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundaries: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggest: Option<Suggest>,
    #[serde(default)]
    pub refs: BTreeMap<LocationType, String>,
    #[serde(flatten)]
    pub levels: LevelMap,
}

impl From<LocationRecord> for LocationDocument {
    fn from(record: LocationRecord) -> Self {
        let own_type = record.location_type;
        let mut refs = record.ancestor_refs.clone();
        refs.insert(own_type, record.id.clone());
        let mut levels = record.ancestors.clone();
        levels.insert(own_type, record.level_fields());

        let inputs = record.suggest_inputs();
        let suggest = (!inputs.is_empty()).then(|| Suggest {
            input: inputs,
            weight: record.population.clamp(0, i64::from(i32::MAX)) as u32,
        });

        Self {
            id: record.id,
            location_type: own_type,
            gn_id: record.xrefs.gn_id,
            woe_id: record.xrefs.woe_id,
            name: record.name,
            abbr: record.abbr,
            alternate_names: record.alternate_names,
            population: record.population,
            center_point: record.center_point,
            boundaries: record.boundaries,
            suggest,
            refs,
            levels: LevelMap(levels),
        }
    }
}

impl From<LocationDocument> for LocationRecord {
    fn from(doc: LocationDocument) -> Self {
        let own_type = doc.location_type;
        let ancestor_refs = doc
            .refs
            .into_iter()
            .filter(|(t, _)| t.is_coarser_than(own_type))
            .collect();
        let ancestors = doc
            .levels
            .0
            .into_iter()
            .filter(|(t, _)| t.is_coarser_than(own_type))
            .collect();

        Self {
            id: doc.id,
            location_type: own_type,
            xrefs: CrossRefs {
                gn_id: doc.gn_id.filter(|n| *n > 0),
                woe_id: doc.woe_id.filter(|n| *n > 0),
            },
            name: doc.name,
            abbr: doc.abbr,
            alternate_names: doc.alternate_names,
            population: doc.population,
            center_point: doc.center_point,
            boundaries: doc.boundaries,
            ancestor_refs,
            ancestors,
        }
    }
}

/// Per-level name data flattened into `{type}_name`, `{type}_abbr` and
/// `{type}_alternate_names` keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelMap(pub BTreeMap<LocationType, LevelFields>);

const NAME_SUFFIX: &str = "_name";
const ABBR_SUFFIX: &str = "_abbr";
const ALT_SUFFIX: &str = "_alternate_names";

impl Serialize for LevelMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (location_type, fields) in &self.0 {
            if let Some(name) = &fields.name {
                map.serialize_entry(&format!("{}{}", location_type, NAME_SUFFIX), name)?;
            }
            if let Some(abbr) = &fields.abbr {
                map.serialize_entry(&format!("{}{}", location_type, ABBR_SUFFIX), abbr)?;
            }
            map.serialize_entry(
                &format!("{}{}", location_type, ALT_SUFFIX),
                &fields.alternate_names,
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LevelMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LevelMapVisitor;

        impl<'de> Visitor<'de> for LevelMapVisitor {
            type Value = LevelMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of type-prefixed level fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<LevelMap, A::Error> {
                let mut levels: BTreeMap<LocationType, LevelFields> = BTreeMap::new();

                while let Some(key) = access.next_key::<String>()? {
                    let parsed = [ALT_SUFFIX, ABBR_SUFFIX, NAME_SUFFIX]
                        .iter()
                        .find_map(|suffix| {
                            let prefix = key.strip_suffix(suffix)?;
                            let location_type = prefix.parse::<LocationType>().ok()?;
                            Some((location_type, *suffix))
                        });

                    let Some((location_type, suffix)) = parsed else {
                        access.next_value::<IgnoredAny>()?;
                        continue;
                    };

                    let entry = levels.entry(location_type).or_default();
                    match suffix {
                        NAME_SUFFIX => entry.name = access.next_value()?,
                        ABBR_SUFFIX => entry.abbr = access.next_value()?,
                        _ => {
                            entry.alternate_names = access
                                .next_value::<Option<Vec<String>>>()?
                                .unwrap_or_default()
                        }
                    }
                }

                Ok(LevelMap(levels))
            }
        }

        deserializer.deserialize_map(LevelMapVisitor)
    }
}
