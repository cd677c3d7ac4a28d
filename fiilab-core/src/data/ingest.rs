use polars::prelude::*;
use std::path::{Path, PathBuf};

use super::provider::{DataError, SnapshotProvider, SnapshotSource};
use super::snapshot::RawSnapshot;

/// Snapshot ingestor for CSV exports.
///
/// Every column is read as text; type decisions belong to the pipeline,
/// not to schema inference.
#[derive(Debug, Clone)]
pub struct CsvIngestor {
    separator: u8,
}

impl CsvIngestor {
    pub fn new() -> Self {
        Self { separator: b',' }
    }

    /// Use a different field separator (`;` is common in pt-BR exports).
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Ingest a CSV file into a raw snapshot.
    pub fn ingest_csv(&self, path: &Path) -> Result<RawSnapshot, DataError> {
        let frame = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_separator(self.separator)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| DataError::IngestFailed(format!("{}: {e}", path.display())))?;

        tracing::debug!(
            path = %path.display(),
            rows = frame.height(),
            columns = frame.width(),
            "csv snapshot ingested"
        );
        Ok(RawSnapshot::new(frame, SnapshotSource::CsvImport))
    }
}

impl Default for CsvIngestor {
    fn default() -> Self {
        Self::new()
    }
}

/// A provider that serves a fixed CSV file.
pub struct CsvFileProvider {
    path: PathBuf,
    ingestor: CsvIngestor,
}

impl CsvFileProvider {
    pub fn new(path: impl Into<PathBuf>, ingestor: CsvIngestor) -> Self {
        Self {
            path: path.into(),
            ingestor,
        }
    }
}

impl SnapshotProvider for CsvFileProvider {
    fn name(&self) -> &str {
        "csv_file"
    }

    fn fetch(&self) -> Result<RawSnapshot, DataError> {
        self.ingestor.ingest_csv(&self.path)
    }
}
