//! Index builder.
//!
//! Reads shape rows from PostGIS, enriches them from the Scylla cache and
//! publishes linked documents into Elasticsearch.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use quattro::config::Config;
use quattro::elasticsearch::{create_index, EsClient};
use quattro::scylla::ScyllaClient;
use quattro::source::{LocationSource, PgSource};
use quattro::{Indexer, LocationType};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "index")]
#[command(about = "Build the location index from shape tables")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Elasticsearch URL
    #[arg(long)]
    es_url: Option<String>,

    /// Elasticsearch index name
    #[arg(long)]
    index: Option<String>,

    /// PostGIS connection string
    #[arg(long)]
    database_url: Option<String>,

    /// ScyllaDB contact node
    #[arg(long)]
    scylla_node: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index a single source row
    One {
        location_type: LocationType,
        gid: i64,
    },
    /// Index every row of every type, coarsest tier first
    All {
        /// Create/recreate the index before the pass
        #[arg(long)]
        create_index: bool,

        /// Tasks in flight per tier
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Create the index with the locations mapping
    CreateIndex {
        #[arg(long)]
        delete_existing: bool,
    },
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(url) = &self.es_url {
            config.elasticsearch.url = url.clone();
        }
        if let Some(index) = &self.index {
            config.elasticsearch.index = index.clone();
        }
        if let Some(url) = &self.database_url {
            config.postgres.url = url.clone();
        }
        if let Some(node) = &self.scylla_node {
            config.scylla.node = node.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.config()?;

    let es_client = EsClient::new(&config.elasticsearch.url, &config.elasticsearch.index)
        .context("Failed to configure Elasticsearch client")?;
    if !es_client.health_check().await? {
        anyhow::bail!("Elasticsearch cluster is not healthy");
    }
    info!("Connected to Elasticsearch");

    if let Command::CreateIndex { delete_existing } = args.command {
        return create_index(&es_client, delete_existing).await;
    }

    let source = Arc::new(
        PgSource::connect(&config.postgres.url, config.postgres.max_connections)
            .await
            .context("Failed to connect to PostGIS")?,
    );
    let cache = ScyllaClient::new(&config.scylla.node, &config.scylla.keyspace).await?;
    let states = config.states.load()?;
    info!("Loaded {} state abbreviations", states.len());

    let indexer = Indexer::new(
        source.clone(),
        Arc::new(cache),
        Arc::new(es_client.clone()),
        Arc::new(states),
    );

    match args.command {
        Command::One { location_type, gid } => {
            match indexer.index(location_type, gid).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => warn!("Nothing indexed for {} {}", location_type, gid),
            }
        }
        Command::All {
            create_index: recreate,
            concurrency,
        } => {
            if recreate {
                create_index(&es_client, true).await?;
            }
            let concurrency = concurrency.unwrap_or(config.indexing.concurrency).max(1);

            let mut failures = 0;
            for &location_type in LocationType::indexable() {
                failures +=
                    index_tier(&indexer, source.as_ref(), location_type, concurrency).await?;

                if config.indexing.refresh_between_tiers {
                    es_client.refresh().await?;
                }
            }

            info!(
                "Full pass complete: {} documents in index, {} failures",
                es_client.doc_count().await?,
                failures
            );
        }
        Command::CreateIndex { .. } => {}
    }

    Ok(())
}

/// Index every row of one type. Returns the number of failed rows.
async fn index_tier(
    indexer: &Indexer,
    source: &dyn LocationSource,
    location_type: LocationType,
    concurrency: usize,
) -> Result<usize> {
    let gids = source.gids(location_type).await?;
    info!("Indexing {} {} rows", gids.len(), location_type);

    let pb = ProgressBar::new(gids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] {msg} [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );
    pb.set_message(location_type.to_string());

    let mut results = stream::iter(gids)
        .map(|gid| async move { (gid, indexer.index(location_type, gid).await) })
        .buffer_unordered(concurrency);

    let mut failures = 0;
    while let Some((gid, result)) = results.next().await {
        pb.inc(1);
        if let Err(e) = result {
            failures += 1;
            error!("Failed to index {} {}: {}", location_type, gid, e);
        }
    }

    pb.finish_with_message(format!("{} done", location_type));
    Ok(failures)
}
