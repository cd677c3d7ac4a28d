//! Cleaning pipeline: raw snapshot -> typed, classified fund table.
//!
//! Stages run strictly in order, each producing a fresh table:
//! column normalization, numeric parsing (with the price row filter),
//! percentage derivation, segment classification.

pub mod columns;
pub mod numeric;
pub mod percent;
pub mod segment;

pub use columns::{normalize_columns, normalize_label};
pub use numeric::{parse_percentage_text, parse_snapshot};
pub use percent::derive_percentages;
pub use segment::{classify_segment, classify_segments};

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::data::{DataError, RawSnapshot};
use crate::domain::FundTable;

/// Structural problems that stop a snapshot from becoming a fund table.
///
/// Bad cells never end up here; they become absent values.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required column '{0}' not found")]
    MissingColumn(String),

    #[error("two columns normalize to '{0}'")]
    DuplicateColumn(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Run every cleaning stage over a raw snapshot.
pub fn run_pipeline(raw: &RawSnapshot) -> Result<FundTable, PipelineError> {
    let normalized = normalize_columns(raw)?;
    let parsed = parse_snapshot(&normalized)?;
    let derived = derive_percentages(&parsed);
    let classified = classify_segments(&derived);

    tracing::info!(
        rows_in = raw.height(),
        rows_out = classified.len(),
        columns = classified.columns().len(),
        "pipeline complete"
    );
    Ok(classified)
}
