//! Core data models for the gazetteer index.

pub mod geo;
pub mod location_type;
pub mod record;

pub use geo::{GeoPoint, Viewbox};
pub use location_type::{LocationType, SHAPE_PRIORITY};
pub use record::{
    normalize_xref, CrossRefs, LevelFields, LocationDocument, LocationRecord, XrefKind,
};
