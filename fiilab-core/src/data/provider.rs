//! Snapshot provider trait and structured error types.
//!
//! The SnapshotProvider trait abstracts over where a raw snapshot comes from
//! (the Fundamentus listing page, a CSV export) so the loader can swap
//! implementations and tests can supply fixtures.

use polars::prelude::PolarsError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::snapshot::RawSnapshot;

/// Structured error types for snapshot acquisition.
///
/// These are designed to be displayable in a CLI context as-is.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("ingest failed: {0}")]
    IngestFailed(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("no cached snapshot in {0}")]
    NoCachedSnapshot(String),

    #[error("table error: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkUnreachable(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Where a raw snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotSource {
    Fundamentus,
    CsvImport,
    Cache,
    InMemory,
}

/// Trait for snapshot providers.
///
/// Providers only fetch; caching sits above this trait.
pub trait SnapshotProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch one full snapshot.
    fn fetch(&self) -> Result<RawSnapshot, DataError>;
}
