//! ScyllaDB-backed enrichment cache.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{EnrichmentCache, GeonameEnrichment};
use crate::error::Error;

/// Key/value table holding one JSON blob per cache key
const ENRICHMENT_TABLE: &str = "enrichment";

#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
    keyspace: String,
}

impl ScyllaClient {
    pub async fn new(node: &str, keyspace: &str) -> Result<Self> {
        info!("Connecting to ScyllaDB at {}...", node);
        let session: Session = SessionBuilder::new()
            .known_node(node)
            .build()
            .await
            .context("Failed to connect to ScyllaDB")?;

        let client = Self {
            session: Arc::new(session),
            keyspace: keyspace.to_string(),
        };

        client.init_schema().await?;
        Ok(client)
    }

    fn table(&self) -> String {
        format!("{}.{}", self.keyspace, ENRICHMENT_TABLE)
    }

    async fn init_schema(&self) -> Result<()> {
        self.session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {}
                     WITH REPLICATION = {{
                        'class' : 'SimpleStrategy',
                        'replication_factor' : 1
                     }}",
                    self.keyspace
                ),
                &[],
            )
            .await?;

        self.session
            .query_unpaged(
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        key text PRIMARY KEY,
                        data text
                    )",
                    self.table()
                ),
                &[],
            )
            .await?;

        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let result: QueryResult = self
            .session
            .query_unpaged(
                format!("SELECT data FROM {} WHERE key = ?", self.table()),
                (key,),
            )
            .await?;

        if let Ok(rows_result) = result.into_rows_result() {
            if let Some((data,)) = rows_result.maybe_first_row::<(String,)>()? {
                return Ok(Some(data));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl EnrichmentCache for ScyllaClient {
    async fn geoname(&self, gn_id: i64) -> crate::error::Result<Option<GeonameEnrichment>> {
        let key = GeonameEnrichment::cache_key(gn_id);
        let Some(data) = self.get(&key).await.map_err(Error::Cache)? else {
            return Ok(None);
        };
        Ok(decode_blob(&key, &data))
    }
}

/// Malformed blobs count as a miss
fn decode_blob(key: &str, data: &str) -> Option<GeonameEnrichment> {
    serde_json::from_str(data)
        .map_err(|e| warn!("Ignoring malformed enrichment {}: {}", key, e))
        .ok()
}
