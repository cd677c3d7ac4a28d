use crate::domain::{schema, Fund, FundTable};

/// Human-scale percentage of a fraction, rounded to 2 decimals (ties to even).
pub fn to_percent(fraction: f64) -> f64 {
    let pct = fraction * 100.0;
    (pct * 100.0).round_ties_even() / 100.0
}

/// Derive `dy_pct`, `ffo_pct` and `vacancia_pct` from their fractions.
///
/// The derived columns are always added, even when the source fraction
/// column is absent, in which case every derived value is `None`. Values
/// are recomputed from scratch, so re-running never leaves a stale one.
pub fn derive_percentages(table: &FundTable) -> FundTable {
    let derived = table.derive(
        &[schema::DY_PCT, schema::FFO_PCT, schema::VACANCY_PCT],
        |fund| Fund {
            dy_pct: fund.dividend_yield.map(to_percent),
            ffo_pct: fund.ffo_yield.map(to_percent),
            vacancy_pct: fund.vacancy.map(to_percent),
            ..fund.clone()
        },
    );
    tracing::debug!(rows = derived.len(), "percentages derived");
    derived
}
