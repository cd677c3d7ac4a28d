//! Time-boxed read-through cache for raw snapshots.
//!
//! Layout: `{cache_dir}/snapshot.parquet` plus a `meta.json` sidecar.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Freshness decided by the sidecar's `fetched_at` against a fixed TTL
//! - Quarantine for corrupt files (`snapshot.parquet.quarantined`)
//! - Only raw snapshots are cached; cleaned tables are always rebuilt

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::provider::{DataError, SnapshotProvider, SnapshotSource};
use super::snapshot::RawSnapshot;

const SNAPSHOT_FILE: &str = "snapshot.parquet";
const META_FILE: &str = "meta.json";

/// Metadata sidecar for the cached snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub fetched_at: DateTime<Utc>,
    pub row_count: usize,
    pub column_count: usize,
    pub source: SnapshotSource,
    pub data_hash: String,
}

impl CacheMeta {
    pub fn age_at(&self, now: DateTime<Utc>) -> ChronoDuration {
        now - self.fetched_at
    }
}

/// What the cache holds relative to its TTL.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheState {
    Missing,
    Fresh(CacheMeta),
    Stale(CacheMeta),
}

/// The snapshot cache.
pub struct SnapshotCache {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(cache_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.cache_dir.join(META_FILE)
    }

    /// Store a snapshot, replacing whatever was cached.
    pub fn write(&self, snapshot: &RawSnapshot) -> Result<CacheMeta, DataError> {
        self.write_at(snapshot, Utc::now())
    }

    /// Store a snapshot stamped with an explicit fetch time.
    pub fn write_at(
        &self,
        snapshot: &RawSnapshot,
        fetched_at: DateTime<Utc>,
    ) -> Result<CacheMeta, DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let mut bytes = Vec::new();
        ParquetWriter::new(&mut bytes)
            .finish(&mut snapshot.frame().clone())
            .map_err(|e| DataError::CacheError(format!("write parquet: {e}")))?;

        let path = self.snapshot_path();
        let tmp_path = path.with_extension("parquet.tmp");
        fs::write(&tmp_path, &bytes)
            .map_err(|e| DataError::CacheError(format!("write temp file: {e}")))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            fetched_at,
            row_count: snapshot.height(),
            column_count: snapshot.frame().width(),
            source: snapshot.source(),
            data_hash: blake3::hash(&bytes).to_hex().to_string(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        tracing::debug!(rows = meta.row_count, hash = %meta.data_hash, "snapshot cached");
        Ok(meta)
    }

    /// Load the cached snapshot regardless of age.
    ///
    /// A file that cannot be read back is quarantined and reported as missing.
    pub fn load(&self) -> Result<RawSnapshot, DataError> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Err(DataError::NoCachedSnapshot(
                self.cache_dir.display().to_string(),
            ));
        }

        match read_parquet(&path) {
            Ok(frame) => Ok(RawSnapshot::new(frame, SnapshotSource::Cache)),
            Err(e) => {
                let quarantine = path.with_extension("parquet.quarantined");
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "quarantining corrupt snapshot cache"
                );
                let _ = fs::rename(&path, &quarantine);
                let _ = fs::remove_file(self.meta_path());
                Err(DataError::NoCachedSnapshot(
                    self.cache_dir.display().to_string(),
                ))
            }
        }
    }

    pub fn get_meta(&self) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Cache state as of `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> CacheState {
        let Some(meta) = self.get_meta() else {
            return CacheState::Missing;
        };
        if !self.snapshot_path().exists() {
            return CacheState::Missing;
        }
        let ttl = ChronoDuration::from_std(self.ttl).unwrap_or(ChronoDuration::MAX);
        if meta.age_at(now) < ttl {
            CacheState::Fresh(meta)
        } else {
            CacheState::Stale(meta)
        }
    }

    pub fn state(&self) -> CacheState {
        self.state_at(Utc::now())
    }

    /// Serve a fresh cached snapshot, or fetch, cache, and return a new one.
    pub fn get_or_fetch(
        &self,
        provider: &dyn SnapshotProvider,
        force: bool,
    ) -> Result<RawSnapshot, DataError> {
        if !force {
            if let CacheState::Fresh(meta) = self.state() {
                match self.load() {
                    Ok(snapshot) => {
                        tracing::info!(
                            rows = meta.row_count,
                            fetched_at = %meta.fetched_at,
                            "using cached snapshot"
                        );
                        return Ok(snapshot);
                    }
                    Err(e) => tracing::warn!(error = %e, "cached snapshot unusable, refetching"),
                }
            }
        }

        tracing::info!(provider = provider.name(), "fetching snapshot");
        let snapshot = provider.fetch()?;
        self.write(&snapshot)?;
        Ok(snapshot)
    }

    /// Remove the cached snapshot and its sidecar.
    pub fn clear(&self) -> Result<(), DataError> {
        for path in [self.snapshot_path(), self.meta_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

fn read_parquet(path: &Path) -> Result<DataFrame, DataError> {
    let file = fs::File::open(path)?;
    let frame = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::CacheError(format!("read parquet: {e}")))?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_snapshot() -> RawSnapshot {
        RawSnapshot::from_text_rows(
            &["Papel".to_string(), "Cotação".to_string()],
            &[
                vec![Some("MXRF11".into()), Some("10.35".into())],
                vec![Some("HGLG11".into()), None],
            ],
            SnapshotSource::Fundamentus,
        )
        .unwrap()
    }

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl SnapshotProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(&self) -> Result<RawSnapshot, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(sample_snapshot())
        }
    }

    #[test]
    fn write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path(), Duration::from_secs(3600));

        let meta = cache.write(&sample_snapshot()).unwrap();
        assert_eq!(meta.row_count, 2);
        assert_eq!(meta.column_count, 2);

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.source(), SnapshotSource::Cache);
        assert_eq!(loaded.height(), 2);
        let price = loaded.frame().column("Cotação").unwrap().str().unwrap();
        assert_eq!(price.get(0), Some("10.35"));
        assert_eq!(price.get(1), None);
    }

    #[test]
    fn load_without_snapshot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path(), Duration::from_secs(3600));
        assert!(matches!(cache.load(), Err(DataError::NoCachedSnapshot(_))));
        assert_eq!(cache.state(), CacheState::Missing);
    }

    #[test]
    fn freshness_follows_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path(), Duration::from_secs(3600));
        let fetched = Utc::now() - ChronoDuration::minutes(30);
        cache.write_at(&sample_snapshot(), fetched).unwrap();

        assert!(matches!(cache.state_at(Utc::now()), CacheState::Fresh(_)));
        assert!(matches!(
            cache.state_at(fetched + ChronoDuration::hours(2)),
            CacheState::Stale(_)
        ));
    }

    #[test]
    fn read_through_fetches_once_while_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path(), Duration::from_secs(3600));
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };

        cache.get_or_fetch(&provider, false).unwrap();
        let second = cache.get_or_fetch(&provider, false).unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.source(), SnapshotSource::Cache);

        cache.get_or_fetch(&provider, true).unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn corrupt_file_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path(), Duration::from_secs(3600));
        cache.write(&sample_snapshot()).unwrap();
        fs::write(dir.path().join(SNAPSHOT_FILE), b"not parquet").unwrap();

        assert!(cache.load().is_err());
        assert!(dir.path().join("snapshot.parquet.quarantined").exists());
        assert_eq!(cache.state(), CacheState::Missing);
    }

    #[test]
    fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path(), Duration::from_secs(3600));
        cache.write(&sample_snapshot()).unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.state(), CacheState::Missing);
    }
}
