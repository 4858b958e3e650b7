//! Elasticsearch client and operations.

mod client;
mod schema;
mod store;

pub use client::EsClient;
pub use schema::{create_index, locations_mapping};
pub use store::{parse_hits, parse_suggestions};
