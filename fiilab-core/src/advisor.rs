//! Suggested similarity windows for a target fund.
//!
//! Advisory only: [`crate::similarity::similar`] never calls this. The
//! caller decides whether to use the suggestion or its own values.

use serde::{Deserialize, Serialize};

use crate::domain::{MacroSegment, ScoredFund, ScoredTable};
use crate::pipeline::columns::strip_accents;
use crate::similarity::SimilarityParams;

/// Yield at or above which the yield window is widened.
const HIGH_YIELD: f64 = 12.0;
/// Yield at or below which (and above zero) the yield window is tightened.
const LOW_YIELD: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestedParams {
    pub yield_tolerance: f64,
    pub ratio_tolerance: f64,
    pub min_liquidity: f64,
}

impl SuggestedParams {
    const BALANCED: Self = Self::new(4.0, 0.20, 30_000.0);
    const PAPERS: Self = Self::new(6.0, 0.25, 20_000.0);
    const BRICK: Self = Self::new(3.0, 0.15, 40_000.0);
    const FUND_OF_FUNDS: Self = Self::new(4.0, 0.20, 25_000.0);

    const fn new(yield_tolerance: f64, ratio_tolerance: f64, min_liquidity: f64) -> Self {
        Self {
            yield_tolerance,
            ratio_tolerance,
            min_liquidity,
        }
    }

    pub fn into_params(self, same_category: bool) -> SimilarityParams {
        SimilarityParams {
            yield_tolerance: self.yield_tolerance,
            ratio_tolerance: self.ratio_tolerance,
            min_liquidity: self.min_liquidity,
            same_category,
        }
    }
}

impl Default for SuggestedParams {
    fn default() -> Self {
        Self::BALANCED
    }
}

/// Suggest similarity windows for `target`.
///
/// An unknown target gets the balanced defaults.
pub fn suggest(table: &ScoredTable, target: &str) -> SuggestedParams {
    let Some(fund) = table.get(target) else {
        tracing::debug!(target, "advisor target not found; using defaults");
        return SuggestedParams::default();
    };

    let mut suggested = by_segment(fund);

    let dy = fund.fund.dy_pct.unwrap_or(0.0);
    if dy >= HIGH_YIELD {
        suggested.yield_tolerance = suggested.yield_tolerance.max(6.0);
    } else if dy > 0.0 && dy <= LOW_YIELD {
        suggested.yield_tolerance = suggested.yield_tolerance.min(3.0);
    }

    tracing::debug!(target, ?suggested, "similarity parameters suggested");
    suggested
}

fn by_segment(fund: &ScoredFund) -> SuggestedParams {
    let urban_income = fund
        .fund
        .segment
        .as_deref()
        .is_some_and(|s| strip_accents(&s.to_lowercase()).contains("renda urbana"));

    match fund.fund.macro_segment {
        Some(MacroSegment::PapersCri) => SuggestedParams::PAPERS,
        Some(m) if m.is_brick() => SuggestedParams::BRICK,
        _ if urban_income => SuggestedParams::BRICK,
        Some(MacroSegment::FundOfFunds) => SuggestedParams::FUND_OF_FUNDS,
        _ => SuggestedParams::BALANCED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fund, RuleFlags};
    use std::collections::BTreeSet;

    fn table_with(segment: &str, macro_segment: MacroSegment, dy: Option<f64>) -> ScoredTable {
        let fund = Fund {
            segment: Some(segment.to_string()),
            macro_segment: Some(macro_segment),
            dy_pct: dy,
            ..Fund::new("TARG11", 100.0)
        };
        ScoredTable::from_parts(
            vec![ScoredFund {
                fund,
                flags: RuleFlags::default(),
            }],
            BTreeSet::new(),
        )
    }

    #[test]
    fn unknown_target_gets_defaults() {
        let t = table_with("Papel", MacroSegment::PapersCri, Some(10.0));
        assert_eq!(suggest(&t, "NOPE11"), SuggestedParams::new(4.0, 0.20, 30_000.0));
    }

    #[test]
    fn papers_are_looser() {
        let t = table_with("Papel", MacroSegment::PapersCri, Some(10.0));
        assert_eq!(suggest(&t, "TARG11"), SuggestedParams::new(6.0, 0.25, 20_000.0));
    }

    #[test]
    fn brick_is_tighter() {
        let t = table_with("Logística", MacroSegment::Logistics, Some(9.0));
        assert_eq!(suggest(&t, "TARG11"), SuggestedParams::new(3.0, 0.15, 40_000.0));

        let t = table_with("Renda Urbana", MacroSegment::Other, Some(9.0));
        assert_eq!(suggest(&t, "TARG11"), SuggestedParams::new(3.0, 0.15, 40_000.0));
    }

    #[test]
    fn fund_of_funds_is_mid() {
        let t = table_with("FII de FIIs", MacroSegment::FundOfFunds, Some(9.0));
        assert_eq!(suggest(&t, "TARG11"), SuggestedParams::new(4.0, 0.20, 25_000.0));
    }

    #[test]
    fn high_yield_widens() {
        let t = table_with("Logística", MacroSegment::Logistics, Some(12.0));
        assert_eq!(suggest(&t, "TARG11").yield_tolerance, 6.0);

        let t = table_with("Papel", MacroSegment::PapersCri, Some(15.0));
        assert_eq!(suggest(&t, "TARG11").yield_tolerance, 6.0);
    }

    #[test]
    fn low_yield_tightens() {
        let t = table_with("Papel", MacroSegment::PapersCri, Some(7.0));
        assert_eq!(suggest(&t, "TARG11").yield_tolerance, 3.0);

        let t = table_with("Híbrido", MacroSegment::Other, Some(5.0));
        assert_eq!(suggest(&t, "TARG11").yield_tolerance, 3.0);
    }

    #[test]
    fn zero_or_absent_yield_is_not_adjusted() {
        let t = table_with("Híbrido", MacroSegment::Other, None);
        assert_eq!(suggest(&t, "TARG11").yield_tolerance, 4.0);

        let t = table_with("Híbrido", MacroSegment::Other, Some(0.0));
        assert_eq!(suggest(&t, "TARG11").yield_tolerance, 4.0);
    }

    #[test]
    fn converts_into_search_params() {
        let p = SuggestedParams::default().into_params(false);
        assert_eq!(p.yield_tolerance, 4.0);
        assert!(!p.same_category);
    }
}
