//! Raw snapshot: the scraped table exactly as received, before cleaning.

use polars::prelude::*;
use std::fmt;

use super::provider::{DataError, SnapshotSource};
use crate::domain::schema;
use crate::pipeline::columns::normalize_label;

/// Minimum row count for a snapshot to be considered usable.
pub const MIN_HEALTHY_ROWS: usize = 10;

/// Raw cells of one snapshot plus their provenance.
///
/// Columns are whatever the source published: text columns for scraped or
/// CSV data, numeric columns when the producer already typed them.
#[derive(Debug, Clone)]
pub struct RawSnapshot {
    frame: DataFrame,
    source: SnapshotSource,
}

impl RawSnapshot {
    pub fn new(frame: DataFrame, source: SnapshotSource) -> Self {
        Self { frame, source }
    }

    /// Build an all-text snapshot from a header row and data rows.
    ///
    /// Short rows are padded with absent cells; extra cells are ignored.
    pub fn from_text_rows(
        headers: &[String],
        rows: &[Vec<Option<String>>],
        source: SnapshotSource,
    ) -> Result<Self, DataError> {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cells: Vec<Option<String>> = rows
                    .iter()
                    .map(|row| row.get(i).cloned().flatten())
                    .collect();
                Column::new(name.as_str().into(), cells)
            })
            .collect::<Vec<_>>();
        let frame = DataFrame::new(columns)?;
        Ok(Self { frame, source })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn source(&self) -> SnapshotSource {
        self.source
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Column labels in source order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Same cells under new column labels.
    pub fn with_column_names(&self, names: &[String]) -> Result<Self, DataError> {
        let mut frame = self.frame.clone();
        frame.set_column_names(names.iter().map(|n| n.as_str()))?;
        Ok(Self {
            frame,
            source: self.source,
        })
    }

    /// Quick structural sanity check before the snapshot is trusted.
    pub fn health(&self) -> SnapshotHealth {
        if self.is_empty() {
            return SnapshotHealth::Empty;
        }
        if self.height() < MIN_HEALTHY_ROWS {
            return SnapshotHealth::TooFewRows(self.height());
        }

        let normalized: Vec<String> = self
            .column_names()
            .iter()
            .map(|c| normalize_label(c))
            .collect();
        let recognised = [schema::TICKER, schema::PRICE, schema::SEGMENT]
            .iter()
            .filter(|expected| normalized.iter().any(|c| c.contains(*expected)))
            .count();
        if recognised < 2 {
            return SnapshotHealth::UnexpectedStructure;
        }

        SnapshotHealth::Healthy
    }
}

/// Result of [`RawSnapshot::health`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotHealth {
    Healthy,
    Empty,
    TooFewRows(usize),
    UnexpectedStructure,
}

impl SnapshotHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for SnapshotHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Empty => write!(f, "empty snapshot"),
            Self::TooFewRows(n) => {
                write!(f, "only {n} rows (expected at least {MIN_HEALTHY_ROWS})")
            }
            Self::UnexpectedStructure => write!(f, "unexpected table structure"),
        }
    }
}
