//! Peer search around a target fund.
//!
//! Candidates must sit inside a dividend-yield window and a P/VP window
//! around the target and clear a liquidity floor, optionally sharing the
//! target's segment label. Results are ranked by yield distance, then P/VP
//! distance, then liquidity (highest first).
//!
//! A target without `dy_pct` or `p_vp` is measured as if the value were 0.0.
//! That can pull in funds that only look close because the target's data
//! is missing; callers showing results for such targets may want to say so.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use crate::domain::{schema, ScoredFund, ScoredTable};

#[derive(Debug, Error, PartialEq)]
pub enum SimilarityError {
    #[error("fund '{0}' not found")]
    TargetNotFound(String),
}

/// Search window for [`similar`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityParams {
    /// Maximum |Δ dy_pct|, in percentage points.
    pub yield_tolerance: f64,
    /// Maximum |Δ p_vp|.
    pub ratio_tolerance: f64,
    /// Minimum candidate liquidity (R$/day).
    pub min_liquidity: f64,
    /// Restrict to funds with the target's exact segment label.
    pub same_category: bool,
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self {
            yield_tolerance: 4.0,
            ratio_tolerance: 0.20,
            min_liquidity: 30_000.0,
            same_category: true,
        }
    }
}

struct Candidate<'a> {
    fund: &'a ScoredFund,
    dy_distance: f64,
    pvp_distance: f64,
    liquidity: f64,
}

/// Rank the funds of `table` that resemble `target`.
///
/// The target never appears in its own result. An empty result is not an
/// error.
pub fn similar(
    table: &ScoredTable,
    target: &str,
    params: &SimilarityParams,
) -> Result<ScoredTable, SimilarityError> {
    let target_fund = table
        .get(target)
        .ok_or_else(|| SimilarityError::TargetNotFound(target.to_string()))?;

    let target_dy = target_fund.fund.dy_pct.unwrap_or(0.0);
    let target_pvp = target_fund.fund.p_vp.unwrap_or(0.0);
    let target_segment = target_fund.fund.segment.as_deref();
    let check_segment = params.same_category && table.has_column(schema::SEGMENT);

    let mut candidates: Vec<Candidate<'_>> = table
        .funds()
        .iter()
        .filter(|f| f.fund.ticker != target)
        .filter(|f| {
            !check_segment
                || (target_segment.is_some() && f.fund.segment.as_deref() == target_segment)
        })
        .filter_map(|f| {
            let dy_distance = (f.fund.dy_pct? - target_dy).abs();
            let pvp_distance = (f.fund.p_vp? - target_pvp).abs();
            let liquidity = f.fund.liquidity?;

            let inside = dy_distance <= params.yield_tolerance
                && pvp_distance <= params.ratio_tolerance
                && liquidity >= params.min_liquidity;
            inside.then_some(Candidate {
                fund: f,
                dy_distance,
                pvp_distance,
                liquidity,
            })
        })
        .collect();

    candidates.sort_by(rank);

    tracing::debug!(target, peers = candidates.len(), ?params, "similarity search");
    Ok(ScoredTable::from_parts(
        candidates.into_iter().map(|c| c.fund.clone()).collect(),
        table.columns().clone(),
    ))
}

fn rank(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.dy_distance
        .total_cmp(&b.dy_distance)
        .then(a.pvp_distance.total_cmp(&b.pvp_distance))
        .then(b.liquidity.total_cmp(&a.liquidity))
}
