//! Query bodies sent to the index store.

use serde_json::{json, Value};

use crate::models::{CrossRefs, GeoPoint, LocationType, Viewbox};

/// Default radius for nearest-feature lookups
pub const DEFAULT_CLOSEST_RADIUS_M: f64 = 100.0;

/// Upper bound on containing shapes fetched per point
pub const ENCOMPASSING_SIZE: usize = 50;

/// Fields searched by full-text queries: the primary name boosted, the two
/// top-level abbreviations, generic features, then each level's names.
pub fn search_fields() -> Vec<String> {
    let mut fields: Vec<String> = ["name^3", "admin1_abbr", "admin0_abbr", "features"]
        .iter()
        .map(|f| f.to_string())
        .collect();
    for location_type in LocationType::all() {
        fields.push(format!("{}_name", location_type));
        fields.push(format!("{}_alternate_names", location_type));
    }
    fields
}

/// Full-text search, optionally bounded by a viewbox and sorted by distance.
///
/// Without an explicit center, a viewbox's midpoint is used.
pub fn search(
    term: &str,
    viewbox: Option<&Viewbox>,
    center: Option<GeoPoint>,
    size: usize,
) -> Value {
    let mut bool_query = json!({
        "must": {
            "query_string": {
                "query": term.to_lowercase(),
                "fields": search_fields(),
                "default_operator": "AND"
            }
        }
    });

    if let Some(vb) = viewbox {
        bool_query["filter"] = json!([{
            "geo_bounding_box": {
                "center_point": {
                    "top_left": { "lat": vb.max_lat, "lon": vb.min_lon },
                    "bottom_right": { "lat": vb.min_lat, "lon": vb.max_lon }
                }
            }
        }]);
    }

    let mut body = json!({
        "query": { "bool": bool_query },
        "size": size
    });

    if let Some(center) = center.or_else(|| viewbox.map(Viewbox::center)) {
        body["sort"] = json!([distance_sort(center, "km")]);
    }

    body
}

/// Completion suggestions for a prefix
pub fn suggest(prefix: &str, size: usize) -> Value {
    json!({
        "suggest": {
            "suggestions": {
                "prefix": prefix,
                "completion": {
                    "field": "suggest",
                    "size": size
                }
            }
        }
    })
}

/// Features of one type within `radius_m` meters, nearest first
pub fn closest(lon: f64, lat: f64, location_type: LocationType, radius_m: f64) -> Value {
    let point = GeoPoint::new(lon, lat);
    json!({
        "query": {
            "bool": {
                "filter": [
                    { "term": { "location_type": location_type.as_str() } },
                    {
                        "geo_distance": {
                            "distance": format!("{}m", radius_m),
                            "center_point": point
                        }
                    }
                ]
            }
        },
        "sort": [distance_sort(point, "m")]
    })
}

/// Every boundary-bearing document whose shape contains the point
pub fn encompassing_shapes(lon: f64, lat: f64) -> Value {
    json!({
        "query": {
            "bool": {
                "must": { "match_all": {} },
                "filter": {
                    "geo_shape": {
                        "boundaries": {
                            "shape": {
                                "type": "point",
                                "coordinates": [lon, lat]
                            },
                            "relation": "intersects"
                        }
                    }
                }
            }
        },
        "size": ENCOMPASSING_SIZE
    })
}

/// Published documents of one type carrying any of the given ids
pub fn cross_reference(location_type: LocationType, xrefs: &CrossRefs, size: usize) -> Value {
    let should: Vec<Value> = xrefs
        .present()
        .map(|(kind, id)| json!({ "term": { kind.field(): id } }))
        .collect();

    json!({
        "query": {
            "bool": {
                "filter": [{ "term": { "location_type": location_type.as_str() } }],
                "should": should,
                "minimum_should_match": 1
            }
        },
        "sort": [{ "id": { "order": "asc" } }],
        "size": size
    })
}

fn distance_sort(center: GeoPoint, unit: &str) -> Value {
    json!({
        "_geo_distance": {
            "center_point": center,
            "order": "asc",
            "unit": unit
        }
    })
}
