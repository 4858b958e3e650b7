//! Library error type.

use thiserror::Error;

use crate::models::LocationType;

/// Failures surfaced by indexing and query operations.
///
/// Domain-level absence (missing rows, cache misses, unlinked ancestors,
/// empty result sets) is never reported through this type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Relational source error: {0}")]
    Source(#[from] sqlx::Error),

    #[error("Enrichment cache error: {0}")]
    Cache(#[source] anyhow::Error),

    #[error("Index store error: {0}")]
    Store(#[from] elasticsearch::Error),

    #[error("Index store returned {status}: {body}")]
    StoreStatus { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown location type: {0}")]
    UnknownLocationType(String),

    #[error("Draft {0} was populated without an id")]
    Unidentified(LocationType),
}

pub type Result<T> = std::result::Result<T, Error>;
