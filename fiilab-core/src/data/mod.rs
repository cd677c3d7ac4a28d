//! Snapshot acquisition and caching

pub mod cache;
pub mod fundamentus;
pub mod ingest;
pub mod provider;
pub mod snapshot;

pub use cache::{CacheMeta, CacheState, SnapshotCache};
pub use fundamentus::{FundamentusProvider, FundamentusSettings, TableExtractor};
pub use ingest::{CsvFileProvider, CsvIngestor};
pub use provider::{DataError, SnapshotProvider, SnapshotSource};
pub use snapshot::{RawSnapshot, SnapshotHealth};
