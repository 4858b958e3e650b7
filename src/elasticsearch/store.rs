//! [`LocationStore`] backed by the Elasticsearch index.

use async_trait::async_trait;
use elasticsearch::http::response::Response;
use elasticsearch::{IndexParts, SearchParts};
use serde_json::Value;
use tracing::{debug, warn};

use super::EsClient;
use crate::error::{Error, Result};
use crate::models::{CrossRefs, LocationRecord, LocationType};
use crate::search::query;
use crate::store::{LocationHit, LocationStore, Suggestion};

impl EsClient {
    async fn run_search(&self, body: Value) -> Result<Value> {
        let response = self
            .client()
            .search(SearchParts::Index(&[&self.index_name]))
            .body(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::StoreStatus {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl LocationStore for EsClient {
    async fn upsert(&self, record: &LocationRecord) -> Result<()> {
        let response = self
            .client()
            .index(IndexParts::IndexId(&self.index_name, &record.id))
            .body(record)
            .send()
            .await?;
        check_status(response).await?;
        debug!("Upserted {}", record.id);
        Ok(())
    }

    async fn find_by_xref(
        &self,
        location_type: LocationType,
        xrefs: &CrossRefs,
        limit: usize,
    ) -> Result<Vec<LocationRecord>> {
        if xrefs.is_empty() {
            return Ok(Vec::new());
        }
        let body = self
            .run_search(query::cross_reference(location_type, xrefs, limit))
            .await?;
        Ok(parse_hits(&body).into_iter().map(|hit| hit.record).collect())
    }

    async fn search(&self, body: Value) -> Result<Vec<LocationHit>> {
        let body = self.run_search(body).await?;
        Ok(parse_hits(&body))
    }

    async fn suggest(&self, body: Value) -> Result<Vec<Suggestion>> {
        let body = self.run_search(body).await?;
        Ok(parse_suggestions(&body))
    }
}

/// Hits of a search response in response order.
///
/// Hits whose `_source` does not decode are skipped.
pub fn parse_hits(body: &Value) -> Vec<LocationHit> {
    let Some(hits) = body["hits"]["hits"].as_array() else {
        return Vec::new();
    };

    hits.iter()
        .filter_map(|hit| {
            let id = hit["_id"].as_str()?.to_string();
            let record = decode_source(&id, &hit["_source"])?;
            Some(LocationHit {
                score: hit["_score"].as_f64(),
                distance: hit["sort"][0].as_f64(),
                id,
                record,
            })
        })
        .collect()
}

/// Options of the `suggestions` completion in response order
pub fn parse_suggestions(body: &Value) -> Vec<Suggestion> {
    let Some(options) = body["suggest"]["suggestions"][0]["options"].as_array() else {
        return Vec::new();
    };

    options
        .iter()
        .filter_map(|option| {
            let id = option["_id"].as_str()?.to_string();
            let record = option
                .get("_source")
                .and_then(|source| decode_source(&id, source));
            Some(Suggestion {
                text: option["text"].as_str().unwrap_or_default().to_string(),
                score: option["_score"].as_f64(),
                id,
                record,
            })
        })
        .collect()
}

fn decode_source(id: &str, source: &Value) -> Option<LocationRecord> {
    serde_json::from_value(source.clone())
        .map_err(|e| warn!("Skipping undecodable document {}: {}", id, e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hits_carry_score_and_distance() {
        let body = json!({
            "hits": { "hits": [
                {
                    "_id": "qs:address:7",
                    "_score": null,
                    "sort": [42.5],
                    "_source": {
                        "id": "qs:address:7",
                        "location_type": "address",
                        "name": "1 Main St",
                        "center_point": [-122.27, 37.8]
                    }
                },
                {
                    "_id": "qs:locality:3",
                    "_score": 1.5,
                    "_source": {
                        "id": "qs:locality:3",
                        "location_type": "locality",
                        "name": "Oakland"
                    }
                }
            ]}
        });

        let hits = parse_hits(&body);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "qs:address:7");
        assert_eq!(hits[0].distance, Some(42.5));
        assert_eq!(hits[0].score, None);
        assert_eq!(hits[0].record.location_type, LocationType::Address);
        assert_eq!(hits[1].score, Some(1.5));
        assert_eq!(hits[1].distance, None);
        assert_eq!(hits[1].record.name, "Oakland");
    }

    #[test]
    fn undecodable_sources_are_skipped() {
        let body = json!({
            "hits": { "hits": [
                { "_id": "bad", "_source": { "location_type": "planet" } },
                {
                    "_id": "qs:admin0:1",
                    "_source": { "id": "qs:admin0:1", "location_type": "admin0", "name": "France" }
                }
            ]}
        });
        let hits = parse_hits(&body);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "qs:admin0:1");
    }

    #[test]
    fn missing_hits_is_empty() {
        assert!(parse_hits(&json!({})).is_empty());
        assert!(parse_suggestions(&json!({ "hits": {} })).is_empty());
    }

    #[test]
    fn suggestion_options() {
        let body = json!({
            "suggest": { "suggestions": [{
                "text": "oak",
                "options": [{
                    "text": "Oakland",
                    "_id": "qs:locality:3",
                    "_score": 12.0,
                    "_source": {
                        "id": "qs:locality:3",
                        "location_type": "locality",
                        "name": "Oakland"
                    }
                }]
            }]}
        });
        let suggestions = parse_suggestions(&body);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].text, "Oakland");
        assert_eq!(suggestions[0].id, "qs:locality:3");
        assert_eq!(suggestions[0].score, Some(12.0));
        assert_eq!(
            suggestions[0].record.as_ref().map(|r| r.name.as_str()),
            Some("Oakland")
        );
    }
}
