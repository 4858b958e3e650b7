//! Query client for the location index.
//!
//! Runs forward search, suggestions, nearest-feature, containing-shape and
//! reverse geocoding lookups and prints the results as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quattro::config::Config;
use quattro::elasticsearch::EsClient;
use quattro::search::DEFAULT_CLOSEST_RADIUS_M;
use quattro::{LocationType, Searcher};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Geocoding queries against the location index")]
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

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full-text search
    Search {
        term: String,
        /// "minLon,maxLat,maxLon,minLat"
        #[arg(long, allow_hyphen_values = true)]
        viewbox: Option<String>,
        /// "lon,lat"
        #[arg(long, allow_hyphen_values = true)]
        center: Option<String>,
        #[arg(long, default_value = "10")]
        size: usize,
    },
    /// Completion suggestions for a prefix
    Suggest {
        prefix: String,
        #[arg(long, default_value = "10")]
        size: usize,
    },
    /// Nearest features of one type
    Closest {
        #[arg(allow_hyphen_values = true)]
        lon: f64,
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(long = "type")]
        location_type: LocationType,
        #[arg(long, default_value_t = DEFAULT_CLOSEST_RADIUS_M)]
        radius: f64,
    },
    /// Every shape containing a point
    Shapes {
        #[arg(allow_hyphen_values = true)]
        lon: f64,
        #[arg(allow_hyphen_values = true)]
        lat: f64,
    },
    /// Best single feature for a point
    Reverse {
        #[arg(allow_hyphen_values = true)]
        lon: f64,
        #[arg(allow_hyphen_values = true)]
        lat: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = args.es_url {
        config.elasticsearch.url = url;
    }
    if let Some(index) = args.index {
        config.elasticsearch.index = index;
    }

    let es_client = EsClient::new(&config.elasticsearch.url, &config.elasticsearch.index)
        .context("Failed to configure Elasticsearch client")?;
    if !es_client.health_check().await? {
        anyhow::bail!("Elasticsearch cluster is not healthy");
    }
    info!(
        "Connected to index '{}' with {} documents",
        config.elasticsearch.index,
        es_client.doc_count().await?
    );

    let searcher = Searcher::new(Arc::new(es_client));

    match args.command {
        Command::Search {
            term,
            viewbox,
            center,
            size,
        } => {
            let hits = searcher
                .search(&term, viewbox.as_deref(), center.as_deref(), size)
                .await?;
            print_json(&hits)
        }
        Command::Suggest { prefix, size } => print_json(&searcher.suggest(&prefix, size).await?),
        Command::Closest {
            lon,
            lat,
            location_type,
            radius,
        } => print_json(&searcher.closest(lon, lat, location_type, radius).await?),
        Command::Shapes { lon, lat } => {
            print_json(&searcher.encompassing_shapes(lon, lat).await?)
        }
        Command::Reverse { lon, lat } => print_json(&searcher.reverse_geocode(lon, lat).await?),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
