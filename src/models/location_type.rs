//! Location types and their specificity order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One tier of the administrative/geographic hierarchy.
///
/// The derived `Ord` is the specificity order, coarsest first:
/// `admin0 < admin1 < ... < address < poi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    /// Country
    Admin0,
    /// State / province
    Admin1,
    /// County
    Admin2,
    /// Municipality
    LocalAdmin,
    /// City / town / village
    Locality,
    Neighborhood,
    Street,
    Address,
    /// Point of interest
    Poi,
}

/// Containing shapes considered by reverse geocoding, finest first.
pub const SHAPE_PRIORITY: [LocationType; 6] = [
    LocationType::Neighborhood,
    LocationType::Locality,
    LocationType::LocalAdmin,
    LocationType::Admin2,
    LocationType::Admin1,
    LocationType::Admin0,
];

impl LocationType {
    /// All types, coarsest first
    pub fn all() -> &'static [LocationType] {
        &[
            LocationType::Admin0,
            LocationType::Admin1,
            LocationType::Admin2,
            LocationType::LocalAdmin,
            LocationType::Locality,
            LocationType::Neighborhood,
            LocationType::Street,
            LocationType::Address,
            LocationType::Poi,
        ]
    }

    /// Types backed by a relational shape table, coarsest first
    pub fn indexable() -> &'static [LocationType] {
        &LocationType::all()[..6]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Admin0 => "admin0",
            LocationType::Admin1 => "admin1",
            LocationType::Admin2 => "admin2",
            LocationType::LocalAdmin => "local_admin",
            LocationType::Locality => "locality",
            LocationType::Neighborhood => "neighborhood",
            LocationType::Street => "street",
            LocationType::Address => "address",
            LocationType::Poi => "poi",
        }
    }

    /// Types strictly coarser than this one, starting with the immediate
    /// parent and ending at `admin0`.
    pub fn ancestors(&self) -> Vec<LocationType> {
        LocationType::all()
            .iter()
            .copied()
            .filter(|t| t < self)
            .rev()
            .collect()
    }

    pub fn is_coarser_than(&self, other: LocationType) -> bool {
        *self < other
    }

    /// Relational table holding the raw rows for this type
    pub fn table(&self) -> Option<String> {
        if LocationType::indexable().contains(self) {
            Some(format!("qs_{}", self.as_str()))
        } else {
            None
        }
    }

    /// Column carrying the intrinsic name
    pub fn name_column(&self) -> Option<&'static str> {
        match self {
            LocationType::Admin0 => Some("qs_a0"),
            LocationType::Admin1 => Some("qs_a1"),
            LocationType::Admin2 => Some("qs_a2"),
            LocationType::LocalAdmin => Some("qs_la"),
            LocationType::Locality => Some("qs_loc"),
            LocationType::Neighborhood => Some("name"),
            _ => None,
        }
    }

    /// Column carrying the abbreviation, for the types whose rows have one
    pub fn abbr_column(&self) -> Option<&'static str> {
        match self {
            LocationType::Admin0 => Some("qs_iso_cc"),
            _ => None,
        }
    }

    /// Geonames and WOE id columns; neighborhoods use unprefixed names
    pub fn xref_columns(&self) -> (&'static str, &'static str) {
        match self {
            LocationType::Neighborhood => ("gn_id", "woe_id"),
            _ => ("qs_gn_id", "qs_woe_id"),
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocationType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownLocationType(s.to_string()))
    }
}
