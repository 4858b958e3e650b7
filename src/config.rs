//! Runtime configuration loaded from TOML.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::indexer::StateAbbreviations;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub elasticsearch: ElasticsearchConfig,
    pub postgres: PostgresConfig,
    pub scylla: ScyllaConfig,
    pub states: StatesConfig,
    pub indexing: IndexingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub index: String,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: "quattro".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/quattroshapes".to_string(),
            max_connections: 8,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScyllaConfig {
    pub node: String,
    pub keyspace: String,
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self {
            node: "127.0.0.1:9042".to_string(),
            keyspace: "quattro".to_string(),
        }
    }
}

/// State abbreviation table; the embedded copy is used when `file` is unset
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StatesConfig {
    pub file: Option<PathBuf>,
}

impl StatesConfig {
    pub fn load(&self) -> Result<StateAbbreviations> {
        let table = match &self.file {
            Some(path) => StateAbbreviations::load_from_file(path)?,
            None => StateAbbreviations::embedded()?,
        };
        Ok(table)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexingConfig {
    /// Tasks in flight per tier during a full pass
    pub concurrency: usize,
    /// Refresh the index after each tier so the next tier can see it
    pub refresh_between_tiers: bool,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            refresh_between_tiers: true,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// File config when a path is given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::load_from_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[elasticsearch]
index = "places"

[indexing]
concurrency = 2
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.elasticsearch.index, "places");
        assert_eq!(config.elasticsearch.url, "http://localhost:9200");
        assert_eq!(config.indexing.concurrency, 2);
        assert!(config.indexing.refresh_between_tiers);
        assert_eq!(config.postgres.max_connections, 8);
        assert_eq!(config.scylla.keyspace, "quattro");
        assert!(config.states.file.is_none());
    }

    #[test]
    fn no_path_means_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.scylla.node, "127.0.0.1:9042");
        assert_eq!(config.states.load().unwrap().len(), 51);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[indexing]\nconcurrency = \"many\"").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }
}
