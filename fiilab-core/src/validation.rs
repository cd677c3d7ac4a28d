//! Sanity checks on user thresholds and on cleaned tables.

use thiserror::Error;

use crate::data::snapshot::MIN_HEALTHY_ROWS;
use crate::domain::FundTable;
use crate::scoring::ScoringThresholds;

pub const MAX_MIN_DIVIDEND_YIELD: f64 = 50.0;
pub const MAX_MAX_P_VP: f64 = 10.0;

/// A threshold outside its plausible range.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ThresholdError {
    #[error("minimum dividend yield must be within 0..=50%, got {0}")]
    DividendYield(f64),

    #[error("maximum P/VP must be within 0..=10, got {0}")]
    PriceToBook(f64),

    #[error("minimum liquidity cannot be negative, got {0}")]
    Liquidity(f64),

    #[error("maximum vacancy must be within 0..=100%, got {0}")]
    Vacancy(f64),

    #[error("minimum market value cannot be negative, got {0}")]
    MarketValue(f64),
}

/// Reject thresholds no sensible screen would use.
///
/// NaN fails every range check.
pub fn validate_thresholds(t: &ScoringThresholds) -> Result<(), ThresholdError> {
    if !(0.0..=MAX_MIN_DIVIDEND_YIELD).contains(&t.min_dividend_yield) {
        return Err(ThresholdError::DividendYield(t.min_dividend_yield));
    }
    if !(0.0..=MAX_MAX_P_VP).contains(&t.max_p_vp) {
        return Err(ThresholdError::PriceToBook(t.max_p_vp));
    }
    if t.min_liquidity.is_nan() || t.min_liquidity < 0.0 {
        return Err(ThresholdError::Liquidity(t.min_liquidity));
    }
    if !(0.0..=100.0).contains(&t.max_vacancy) {
        return Err(ThresholdError::Vacancy(t.max_vacancy));
    }
    if t.min_market_value.is_nan() || t.min_market_value < 0.0 {
        return Err(ThresholdError::MarketValue(t.min_market_value));
    }
    Ok(())
}

/// Coarse quality verdict for a cleaned table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableQuality {
    Usable(usize),
    Empty,
    /// Fewer priced funds than a listing normally has.
    TooFewPriced(usize),
    MissingColumns(Vec<String>),
}

/// Check row count and required columns of a cleaned table.
pub fn assess_table(table: &FundTable, required: &[&str]) -> TableQuality {
    let missing = table.missing_columns(required);
    if !missing.is_empty() {
        return TableQuality::MissingColumns(missing.into_iter().map(String::from).collect());
    }
    match table.len() {
        0 => TableQuality::Empty,
        n if n < MIN_HEALTHY_ROWS => TableQuality::TooFewPriced(n),
        n => TableQuality::Usable(n),
    }
}
