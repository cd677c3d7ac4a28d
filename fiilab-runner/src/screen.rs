//! Screening: score, narrow by segment, cut by minimum score, advise.
//!
//! Segment filters apply to the scored table, so the pass rate used for
//! the advice is measured against the funds the user is looking at, not
//! the whole listing.

use serde::{Deserialize, Serialize};
use std::fmt;

use fiilab_core::domain::{FundTable, MacroSegment, ScoredTable};
use fiilab_core::scoring::{score, ScoringThresholds};
use fiilab_core::validation::{validate_thresholds, ThresholdError};

/// Pass rate below which filters are reported as too restrictive (percent).
pub const RESTRICTIVE_PCT: f64 = 1.0;
/// Pass rate above which filters are reported as too loose (percent).
pub const LOOSE_PCT: f64 = 80.0;

/// Everything a screen needs, already resolved by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRequest {
    pub thresholds: ScoringThresholds,
    pub min_score: u8,
    /// Keep only these macro-segments; empty keeps all.
    #[serde(default)]
    pub macro_segments: Vec<MacroSegment>,
    /// Keep only these raw segment labels; empty keeps all.
    #[serde(default)]
    pub segments: Vec<String>,
}

impl ScreenRequest {
    pub fn new(thresholds: ScoringThresholds, min_score: u8) -> Self {
        Self {
            thresholds,
            min_score,
            macro_segments: Vec::new(),
            segments: Vec::new(),
        }
    }
}

/// How the current filters behave on the screened universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterAdvice {
    NoneFound,
    TooRestrictive { pass_pct: f64 },
    TooLoose { pass_pct: f64 },
    Balanced { pass_pct: f64 },
}

impl FilterAdvice {
    pub fn assess(total: usize, passed: usize) -> Self {
        if passed == 0 {
            return Self::NoneFound;
        }
        let pass_pct = if total > 0 {
            passed as f64 * 100.0 / total as f64
        } else {
            0.0
        };
        if pass_pct < RESTRICTIVE_PCT {
            Self::TooRestrictive { pass_pct }
        } else if pass_pct > LOOSE_PCT {
            Self::TooLoose { pass_pct }
        } else {
            Self::Balanced { pass_pct }
        }
    }
}

impl fmt::Display for FilterAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoneFound => write!(
                f,
                "No fund passed. Try a lower minimum score or dividend yield, a higher \
                 P/VP or vacancy limit, or a lower liquidity floor."
            ),
            Self::TooRestrictive { pass_pct } => write!(
                f,
                "Filters are very restrictive: only {pass_pct:.1}% of funds passed. \
                 Consider relaxing some criteria."
            ),
            Self::TooLoose { pass_pct } => write!(
                f,
                "Filters are very loose: {pass_pct:.1}% of funds passed. \
                 Consider tightening them for a sharper selection."
            ),
            Self::Balanced { pass_pct } => {
                write!(f, "Filters are balanced: {pass_pct:.1}% of funds selected.")
            }
        }
    }
}

/// Output of [`screen`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenResult {
    /// Scored funds after the segment filters; the universe for peer search.
    pub scored: ScoredTable,
    /// Funds at or above the minimum score.
    pub passed: ScoredTable,
    pub advice: FilterAdvice,
}

/// Run a screen over a cleaned table.
pub fn screen(table: &FundTable, request: &ScreenRequest) -> Result<ScreenResult, ThresholdError> {
    validate_thresholds(&request.thresholds)?;

    let scored = score(table, &request.thresholds).filter(|f| {
        let macro_ok = request.macro_segments.is_empty()
            || f.fund
                .macro_segment
                .is_some_and(|m| request.macro_segments.contains(&m));
        let segment_ok = request.segments.is_empty()
            || f.fund
                .segment
                .as_ref()
                .is_some_and(|s| request.segments.contains(s));
        macro_ok && segment_ok
    });

    let passed = scored.with_min_score(request.min_score);
    let advice = FilterAdvice::assess(scored.len(), passed.len());

    tracing::info!(
        universe = scored.len(),
        passed = passed.len(),
        min_score = request.min_score,
        "screen complete"
    );
    Ok(ScreenResult {
        scored,
        passed,
        advice,
    })
}

/// Distinct segment labels, sorted; for building filter choices.
pub fn available_segments(table: &FundTable) -> Vec<String> {
    let mut segments: Vec<String> = table
        .funds()
        .iter()
        .filter_map(|f| f.segment.clone())
        .collect();
    segments.sort();
    segments.dedup();
    segments
}

/// Distinct macro-segments present in the table, in enum order.
pub fn available_macro_segments(table: &FundTable) -> Vec<MacroSegment> {
    let mut segments: Vec<MacroSegment> =
        table.funds().iter().filter_map(|f| f.macro_segment).collect();
    segments.sort();
    segments.dedup();
    segments
}
