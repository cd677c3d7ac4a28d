//! Market overview: headline numbers for a cleaned listing.
//!
//! Means skip absent cells; a metric with no value anywhere has no mean.
//! The market-value total treats absent cells as zero.

use serde::{Deserialize, Serialize};

use fiilab_core::domain::{Fund, FundTable};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub fund_count: usize,
    pub mean_dy_pct: Option<f64>,
    pub mean_p_vp: Option<f64>,
    pub mean_vacancy_pct: Option<f64>,
    pub total_market_value: f64,
}

pub fn overview(table: &FundTable) -> MarketOverview {
    let funds = table.funds();
    MarketOverview {
        fund_count: funds.len(),
        mean_dy_pct: mean(funds, |f| f.dy_pct),
        mean_p_vp: mean(funds, |f| f.p_vp),
        mean_vacancy_pct: mean(funds, |f| f.vacancy_pct),
        total_market_value: funds.iter().filter_map(|f| f.market_value).sum(),
    }
}

fn mean(funds: &[Fund], metric: impl Fn(&Fund) -> Option<f64>) -> Option<f64> {
    let (sum, n) = funds
        .iter()
        .filter_map(metric)
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fund(ticker: &str, dy: Option<f64>, vm: Option<f64>) -> Fund {
        Fund {
            dy_pct: dy,
            p_vp: Some(1.0),
            market_value: vm,
            ..Fund::new(ticker, 10.0)
        }
    }

    #[test]
    fn means_skip_absent_values() {
        let table = FundTable::new(
            vec![
                fund("AAAA11", Some(8.0), Some(1e9)),
                fund("BBBB11", None, None),
                fund("CCCC11", Some(12.0), Some(5e8)),
            ],
            ["papel", "dy_pct", "p_vp", "valor_de_mercado"],
        );
        let o = overview(&table);
        assert_eq!(o.fund_count, 3);
        assert_eq!(o.mean_dy_pct, Some(10.0));
        assert_eq!(o.mean_p_vp, Some(1.0));
        assert_eq!(o.mean_vacancy_pct, None);
        assert_eq!(o.total_market_value, 1.5e9);
    }

    #[test]
    fn empty_table_has_no_means() {
        let o = overview(&FundTable::default());
        assert_eq!(o.fund_count, 0);
        assert_eq!(o.mean_dy_pct, None);
        assert_eq!(o.total_market_value, 0.0);
    }
}
