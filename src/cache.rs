//! Geoname enrichment cache seam.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;

/// Enrichment data cached per geonames id
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeonameEnrichment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alternate_names: Vec<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub population: i64,
}

impl GeonameEnrichment {
    pub fn cache_key(gn_id: i64) -> String {
        format!("geoname:{}", gn_id)
    }
}

#[async_trait]
pub trait EnrichmentCache: Send + Sync {
    /// Look up the blob for `gn_id`; a miss is `Ok(None)`
    async fn geoname(&self, gn_id: i64) -> Result<Option<GeonameEnrichment>>;
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Integer, numeric string or null; anything unparseable is 0
fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => crate::models::normalize_xref(Some(&s))
            .or_else(|| s.trim().parse::<i64>().ok())
            .unwrap_or(0),
        _ => 0,
    })
}
