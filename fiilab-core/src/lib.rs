//! FiiLab Core: snapshot acquisition, cleaning pipeline, scoring, peer search.
//!
//! This crate turns a scraped FII listing into something you can reason about:
//! - Raw snapshot layer (Fundamentus provider, CSV ingest, Parquet cache)
//! - Column normalizer and locale-aware numeric parser
//! - Percentage deriver and macro-segment classifier
//! - Five-rule scoring engine
//! - Similarity engine and its parameter advisor
//!
//! Every stage takes a table by reference and returns a new one.

pub mod advisor;
pub mod data;
pub mod domain;
pub mod pipeline;
pub mod scoring;
pub mod similarity;
pub mod validation;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: tables and their parts can cross threads, so a
    /// front end can rebuild them on a worker.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Fund>();
        require_sync::<domain::Fund>();
        require_send::<domain::FundTable>();
        require_sync::<domain::FundTable>();
        require_send::<domain::ScoredTable>();
        require_sync::<domain::ScoredTable>();
        require_send::<data::RawSnapshot>();
        require_sync::<data::RawSnapshot>();
        require_send::<data::SnapshotCache>();
        require_sync::<data::SnapshotCache>();
        require_send::<data::FundamentusProvider>();
        require_sync::<data::FundamentusProvider>();
        require_send::<scoring::ScoringThresholds>();
        require_sync::<scoring::ScoringThresholds>();
        require_send::<similarity::SimilarityParams>();
        require_sync::<similarity::SimilarityParams>();
    }

    /// Architecture contract: the similarity engine does not consult the
    /// advisor. `similar` takes explicit parameters; the only way to use a
    /// suggestion is to convert it first.
    #[test]
    fn similarity_takes_explicit_params() {
        fn _check(
            table: &domain::ScoredTable,
        ) -> Result<domain::ScoredTable, similarity::SimilarityError> {
            let params = advisor::suggest(table, "X").into_params(true);
            similarity::similar(table, "X", &params)
        }
    }
}
