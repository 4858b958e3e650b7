//! Points and boxes in decimal degrees.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Geographic point, serialized as `[lon, lat]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Parse a WKT point such as `POINT(-73.98 40.75)`.
    ///
    /// Everything except digits, `.`, `-` and spaces is stripped and the rest
    /// split on whitespace. Anything other than exactly two numbers yields
    /// `None`.
    pub fn from_wkt(wkt: &str) -> Option<Self> {
        let cleaned: String = wkt
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | ' '))
            .collect();

        let coords = cleaned
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()
            .ok()?;

        match coords.as_slice() {
            [lon, lat] => Some(Self::new(*lon, *lat)),
            _ => None,
        }
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lon, point.lat]
    }
}

/// `"lon,lat"`
impl FromStr for GeoPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_degrees(s)?;
        match parts.as_slice() {
            [lon, lat] => Ok(Self::new(*lon, *lat)),
            _ => Err(format!("expected \"lon,lat\", got {:?}", s)),
        }
    }
}

/// Search viewbox, written `"minLon,maxLat,maxLon,minLat"`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewbox {
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
    pub min_lat: f64,
}

impl Viewbox {
    /// Midpoint of the box, rounded to 6 decimal places
    pub fn center(&self) -> GeoPoint {
        let lon = (self.min_lon - self.max_lon) / 2.0 + self.max_lon;
        let lat = (self.max_lat - self.min_lat) / 2.0 + self.min_lat;
        GeoPoint::new(round6(lon), round6(lat))
    }
}

impl FromStr for Viewbox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_degrees(s)?;
        match parts.as_slice() {
            [min_lon, max_lat, max_lon, min_lat] => Ok(Self {
                min_lon: *min_lon,
                max_lat: *max_lat,
                max_lon: *max_lon,
                min_lat: *min_lat,
            }),
            _ => Err(format!(
                "expected \"minLon,maxLat,maxLon,minLat\", got {:?}",
                s
            )),
        }
    }
}

fn parse_degrees(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid degree value {:?}: {}", p, e))
        })
        .collect()
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wkt_point_parses() {
        assert_eq!(
            GeoPoint::from_wkt("POINT(-73.985 40.758)"),
            Some(GeoPoint::new(-73.985, 40.758))
        );
    }

    #[test]
    fn malformed_wkt_is_empty() {
        assert_eq!(GeoPoint::from_wkt(""), None);
        assert_eq!(GeoPoint::from_wkt("POINT EMPTY"), None);
        assert_eq!(GeoPoint::from_wkt("POINT(1 2 3)"), None);
        assert_eq!(GeoPoint::from_wkt("POINT(1.2.3 4)"), None);
    }

    #[test]
    fn viewbox_midpoint() {
        let vb: Viewbox = "-1,2,3,-4".parse().unwrap();
        assert_eq!(vb.center(), GeoPoint::new(1.0, -1.0));
    }

    #[test]
    fn viewbox_requires_four_values() {
        assert!("1,2,3".parse::<Viewbox>().is_err());
        assert!("a,b,c,d".parse::<Viewbox>().is_err());
    }

    #[test]
    fn center_string_is_lon_lat() {
        let p: GeoPoint = " 2.35, 48.85".parse().unwrap();
        assert_eq!(p, GeoPoint::new(2.35, 48.85));
        assert_eq!(serde_json::to_value(p).unwrap(), serde_json::json!([2.35, 48.85]));
    }
}
