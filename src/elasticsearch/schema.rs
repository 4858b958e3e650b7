//! Index bootstrap for the locations mapping.

use anyhow::{Context, Result};
use elasticsearch::indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts};
use tracing::info;

use super::EsClient;

/// Mapping JSON embedded at compile time
const LOCATIONS_MAPPING: &str = include_str!("../../schema/locations_mapping.json");

/// Parsed locations mapping
pub fn locations_mapping() -> Result<serde_json::Value> {
    serde_json::from_str(LOCATIONS_MAPPING).context("Failed to parse locations_mapping.json")
}

async fn index_exists(client: &EsClient) -> Result<bool> {
    let response = client
        .client()
        .indices()
        .exists(IndicesExistsParts::Index(&[&client.index_name]))
        .send()
        .await?;
    Ok(response.status_code().is_success())
}

/// Create the locations index, optionally dropping an existing one first.
///
/// An existing index is left untouched unless `delete_existing` is set.
pub async fn create_index(client: &EsClient, delete_existing: bool) -> Result<()> {
    let index_name = &client.index_name;

    if index_exists(client).await? {
        if !delete_existing {
            info!("Index {} already exists, keeping it", index_name);
            return Ok(());
        }
        info!("Deleting existing index: {}", index_name);
        client
            .client()
            .indices()
            .delete(IndicesDeleteParts::Index(&[index_name]))
            .send()
            .await
            .context("Failed to delete existing index")?;
    }

    info!("Creating index: {}", index_name);
    let response = client
        .client()
        .indices()
        .create(IndicesCreateParts::Index(index_name))
        .body(locations_mapping()?)
        .send()
        .await
        .context("Failed to create index")?;

    if !response.status_code().is_success() {
        anyhow::bail!("Failed to create index {}: {}", index_name, response.text().await?);
    }

    info!("Index {} created", index_name);
    Ok(())
}
