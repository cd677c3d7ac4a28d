//! Rule-based quality score.
//!
//! Five independent threshold rules, one flag each; the score is the
//! number of flags that hold. A fund missing a metric fails that rule.

use serde::{Deserialize, Serialize};

use crate::domain::{Fund, FundTable, RuleFlags, ScoredFund, ScoredTable};

/// Limits for the five rules.
///
/// `min_dividend_yield` and `max_vacancy` are in percent (compared against
/// `dy_pct` / `vacancia_pct`); the rest are in the source's own units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringThresholds {
    pub min_dividend_yield: f64,
    pub max_p_vp: f64,
    pub min_liquidity: f64,
    pub max_vacancy: f64,
    pub min_market_value: f64,
}

impl ScoringThresholds {
    /// Conservative limits for a first screen.
    pub fn beginner() -> Self {
        Self {
            min_dividend_yield: 8.0,
            max_p_vp: 1.20,
            min_liquidity: 20_000.0,
            max_vacancy: 15.0,
            min_market_value: 100_000_000.0,
        }
    }

    /// Wide-open limits; almost every fund passes every rule.
    pub fn advanced() -> Self {
        Self {
            min_dividend_yield: 0.0,
            max_p_vp: 3.0,
            min_liquidity: 0.0,
            max_vacancy: 100.0,
            min_market_value: 0.0,
        }
    }

    /// Evaluate the five rules for one fund.
    pub fn flags(&self, fund: &Fund) -> RuleFlags {
        let at_least = |v: Option<f64>, min: f64| v.is_some_and(|v| v >= min);
        let at_most = |v: Option<f64>, max: f64| v.is_some_and(|v| v <= max);

        RuleFlags {
            dy_ok: at_least(fund.dy_pct, self.min_dividend_yield),
            pvp_ok: at_most(fund.p_vp, self.max_p_vp),
            liquidity_ok: at_least(fund.liquidity, self.min_liquidity),
            vacancy_ok: at_most(fund.vacancy_pct, self.max_vacancy),
            size_ok: at_least(fund.market_value, self.min_market_value),
        }
    }
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self::beginner()
    }
}

/// Score every fund of `table`.
pub fn score(table: &FundTable, thresholds: &ScoringThresholds) -> ScoredTable {
    let funds: Vec<ScoredFund> = table
        .funds()
        .iter()
        .map(|fund| ScoredFund {
            flags: thresholds.flags(fund),
            fund: fund.clone(),
        })
        .collect();

    tracing::debug!(rows = funds.len(), ?thresholds, "funds scored");
    ScoredTable::from_parts(funds, ScoredTable::scored_columns(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema;

    fn fund(ticker: &str) -> Fund {
        Fund {
            dy_pct: Some(10.0),
            p_vp: Some(0.95),
            liquidity: Some(50_000.0),
            vacancy_pct: Some(5.0),
            market_value: Some(500_000_000.0),
            ..Fund::new(ticker, 100.0)
        }
    }

    #[test]
    fn all_rules_pass() {
        let flags = ScoringThresholds::beginner().flags(&fund("AAAA11"));
        assert_eq!(flags.count(), 5);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let t = ScoringThresholds::beginner();
        let f = Fund {
            dy_pct: Some(8.0),
            p_vp: Some(1.20),
            liquidity: Some(20_000.0),
            vacancy_pct: Some(15.0),
            market_value: Some(100_000_000.0),
            ..Fund::new("AAAA11", 10.0)
        };
        assert_eq!(t.flags(&f).count(), 5);
    }

    #[test]
    fn absent_metrics_fail_their_rule() {
        let flags = ScoringThresholds::advanced().flags(&Fund::new("AAAA11", 10.0));
        assert_eq!(flags, RuleFlags::default());
    }

    #[test]
    fn individual_failures() {
        let t = ScoringThresholds::beginner();
        let f = Fund {
            dy_pct: Some(7.99),
            p_vp: Some(1.5),
            ..fund("AAAA11")
        };
        let flags = t.flags(&f);
        assert!(!flags.dy_ok);
        assert!(!flags.pvp_ok);
        assert!(flags.liquidity_ok && flags.vacancy_ok && flags.size_ok);
        assert_eq!(flags.count(), 3);
    }

    #[test]
    fn score_adds_flag_columns() {
        let table = FundTable::new(vec![fund("AAAA11"), Fund::new("BBBB11", 1.0)], ["papel"]);
        let scored = score(&table, &ScoringThresholds::beginner());

        assert_eq!(scored.len(), 2);
        assert_eq!(scored.get("AAAA11").unwrap().score(), 5);
        assert_eq!(scored.get("BBBB11").unwrap().score(), 0);
        assert!(scored.has_column(schema::SCORE));
        for column in schema::FLAG_COLUMNS {
            assert!(scored.has_column(column));
        }
    }

    #[test]
    fn scoring_leaves_input_untouched() {
        let table = FundTable::new(vec![fund("AAAA11")], ["papel"]);
        let before = table.clone();
        let _ = score(&table, &ScoringThresholds::advanced());
        assert_eq!(table, before);
    }
}
