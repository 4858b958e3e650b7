//! Quattro - builds a geocoding index from boundary shape tables and
//! answers forward and reverse geocoding queries against it.
//!
//! This library provides the shared modules for the index and query binaries.

pub mod cache;
pub mod config;
pub mod elasticsearch;
pub mod error;
pub mod indexer;
pub mod linker;
pub mod models;
pub mod scylla;
pub mod search;
pub mod source;
pub mod store;

pub use error::{Error, Result};
pub use indexer::Indexer;
pub use models::{LocationRecord, LocationType};
pub use search::Searcher;
