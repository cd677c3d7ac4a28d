//! Snapshot loading and table building for the runner.
//!
//! Resolves the raw listing, then cleans it. Fallback policy:
//! 1. An explicit CSV file → ingest it, never cached
//! 2. Offline → cached snapshot of any age
//! 3. Fresh cached snapshot → use it (unless forced)
//! 4. Otherwise download, cache, and use the new snapshot
//! 5. Download failed but a stale snapshot exists → use the stale one
//! 6. Otherwise → fail with a clear error

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use fiilab_core::data::{
    CacheState, CsvIngestor, DataError, RawSnapshot, SnapshotCache, SnapshotHealth,
    SnapshotProvider, SnapshotSource,
};
use fiilab_core::domain::FundTable;
use fiilab_core::pipeline::{run_pipeline, PipelineError};
use fiilab_core::validation::{assess_table, TableQuality};

/// Errors from the loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no cached snapshot available offline (run `fiilab fetch` first)")]
    NoCachedSnapshotOffline,

    #[error("no snapshot provider configured and nothing cached")]
    NoProvider,

    #[error("snapshot rejected: {0}")]
    Unhealthy(SnapshotHealth),

    #[error("required columns missing after cleaning: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("only {0} priced funds after cleaning")]
    TooFewFunds(usize),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Options controlling where the snapshot comes from.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Read this CSV export instead of the cache or the network.
    pub csv: Option<PathBuf>,
    /// Field separator for `csv`.
    pub csv_separator: Option<u8>,
    /// Never make network requests.
    pub offline: bool,
    /// Refetch even if the cached snapshot is fresh.
    pub force: bool,
}

/// A cleaned table plus where its snapshot came from.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: FundTable,
    pub source: SnapshotSource,
    /// Fetch time of the cached snapshot, when it came from the cache.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Rows in the raw snapshot, before cleaning.
    pub raw_rows: usize,
}

/// Resolve the raw snapshot following the fallback policy.
pub fn load_snapshot(
    cache: &SnapshotCache,
    provider: Option<&dyn SnapshotProvider>,
    opts: &LoadOptions,
) -> Result<RawSnapshot, LoadError> {
    let snapshot = resolve(cache, provider, opts)?;

    let health = snapshot.health();
    if !health.is_healthy() {
        return Err(LoadError::Unhealthy(health));
    }
    Ok(snapshot)
}

fn resolve(
    cache: &SnapshotCache,
    provider: Option<&dyn SnapshotProvider>,
    opts: &LoadOptions,
) -> Result<RawSnapshot, LoadError> {
    if let Some(path) = &opts.csv {
        let mut ingestor = CsvIngestor::new();
        if let Some(sep) = opts.csv_separator {
            ingestor = ingestor.with_separator(sep);
        }
        return Ok(ingestor.ingest_csv(path)?);
    }

    if opts.offline {
        return cache.load().map_err(|_| LoadError::NoCachedSnapshotOffline);
    }

    let Some(provider) = provider else {
        return cache.load().map_err(|_| LoadError::NoProvider);
    };

    match cache.get_or_fetch(provider, opts.force) {
        Ok(snapshot) => Ok(snapshot),
        Err(e) => {
            if let CacheState::Stale(meta) = cache.state() {
                tracing::warn!(
                    error = %e,
                    fetched_at = %meta.fetched_at,
                    "download failed; falling back to stale snapshot"
                );
                return Ok(cache.load()?);
            }
            Err(e.into())
        }
    }
}

/// Clean a raw snapshot and check it against the required columns.
pub fn build_table(raw: &RawSnapshot, required: &[&str]) -> Result<FundTable, LoadError> {
    let table = run_pipeline(raw)?;
    match assess_table(&table, required) {
        TableQuality::Usable(_) => Ok(table),
        TableQuality::Empty => Err(LoadError::TooFewFunds(0)),
        TableQuality::TooFewPriced(n) => Err(LoadError::TooFewFunds(n)),
        TableQuality::MissingColumns(missing) => Err(LoadError::MissingColumns(missing)),
    }
}

/// Resolve, check, and clean in one go.
pub fn load_table(
    cache: &SnapshotCache,
    provider: Option<&dyn SnapshotProvider>,
    opts: &LoadOptions,
    required: &[&str],
) -> Result<LoadedTable, LoadError> {
    let raw = load_snapshot(cache, provider, opts)?;
    let table = build_table(&raw, required)?;

    let fetched_at = match raw.source() {
        SnapshotSource::Cache => cache.get_meta().map(|m| m.fetched_at),
        _ => None,
    };

    tracing::info!(
        source = ?raw.source(),
        raw_rows = raw.height(),
        funds = table.len(),
        "table loaded"
    );
    Ok(LoadedTable {
        table,
        source: raw.source(),
        fetched_at,
        raw_rows: raw.height(),
    })
}
