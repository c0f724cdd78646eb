//! Error types for the Casa engine.

use crate::{MediaKind, PropertyId};
use thiserror::Error;

/// Failures reported by a remote store or blob bucket.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("database error: {0}")]
    Database(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("remote row not found: {0}")]
    NotFound(String),
}

/// All possible errors from the Casa engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Lookup errors
    #[error("no {kind} at index {index} (collection has {len})")]
    IndexOutOfRange {
        kind: MediaKind,
        index: usize,
        len: usize,
    },

    #[error("media record not found: {0}")]
    RecordNotFound(String),

    // Business rules
    #[error("at most {limit} images can be featured")]
    FeaturedLimit { limit: usize },

    #[error("media record {0} has no server id yet")]
    NotPersisted(String),

    #[error("property {property_id} has {count} media rows with url {url}")]
    DuplicateUrl {
        property_id: PropertyId,
        url: String,
        count: u64,
    },

    // Invariant violations
    #[error("duplicate sort order {sort_order} for {kind}")]
    DuplicateSortOrder { kind: MediaKind, sort_order: i64 },

    #[error("{0} records are marked as main image")]
    MultipleMain(usize),

    #[error("{count} records are featured (limit {limit})")]
    TooManyFeatured { count: usize, limit: usize },

    #[error("temporary id {0} is attached to a saved property")]
    StaleTemporaryId(String),

    // Remote failures
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),

    // State errors
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("invalid time '{0}'")]
    InvalidTime(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
