use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification bucket derived from the free-text segment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MacroSegment {
    #[serde(rename = "Papéis / CRI")]
    PapersCri,
    #[serde(rename = "Logístico")]
    Logistics,
    #[serde(rename = "Shoppings")]
    Shopping,
    #[serde(rename = "FOF / FII de FIIs")]
    FundOfFunds,
    #[serde(rename = "Lajes / Escritórios")]
    Offices,
    #[serde(rename = "Outros")]
    Other,
    /// The snapshot carried no segment column at all.
    #[serde(rename = "Desconhecido")]
    Unknown,
}

impl MacroSegment {
    pub const ALL: [MacroSegment; 7] = [
        Self::PapersCri,
        Self::Logistics,
        Self::Shopping,
        Self::FundOfFunds,
        Self::Offices,
        Self::Other,
        Self::Unknown,
    ];

    /// Display label, as shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PapersCri => "Papéis / CRI",
            Self::Logistics => "Logístico",
            Self::Shopping => "Shoppings",
            Self::FundOfFunds => "FOF / FII de FIIs",
            Self::Offices => "Lajes / Escritórios",
            Self::Other => "Outros",
            Self::Unknown => "Desconhecido",
        }
    }

    /// Parse a display label back into a segment. Accepts the labels
    /// produced by [`MacroSegment::label`] only.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Property-backed ("tijolo") segments.
    pub fn is_brick(&self) -> bool {
        matches!(self, Self::Logistics | Self::Shopping | Self::Offices)
    }
}

impl fmt::Display for MacroSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One traded real-estate fund after cleaning.
///
/// Fraction fields (`dividend_yield`, `ffo_yield`, `cap_rate`, `vacancy`) are
/// in 0-1 scale; the `*_pct` fields are their percentage form and are only
/// filled in by the percentage deriver. `macro_segment` stays `None` until
/// the segment classifier has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    pub ticker: String,
    pub segment: Option<String>,
    pub macro_segment: Option<MacroSegment>,
    pub price: f64,
    pub ffo_yield: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub cap_rate: Option<f64>,
    pub vacancy: Option<f64>,
    pub p_vp: Option<f64>,
    pub market_value: Option<f64>,
    pub liquidity: Option<f64>,
    pub property_count: Option<f64>,
    pub price_per_m2: Option<f64>,
    pub rent_per_m2: Option<f64>,
    pub dy_pct: Option<f64>,
    pub ffo_pct: Option<f64>,
    pub vacancy_pct: Option<f64>,
}

impl Fund {
    /// A fund with only its identifier and price known.
    pub fn new(ticker: impl Into<String>, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            segment: None,
            macro_segment: None,
            price,
            ffo_yield: None,
            dividend_yield: None,
            cap_rate: None,
            vacancy: None,
            p_vp: None,
            market_value: None,
            liquidity: None,
            property_count: None,
            price_per_m2: None,
            rent_per_m2: None,
            dy_pct: None,
            ffo_pct: None,
            vacancy_pct: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_roundtrip() {
        for segment in MacroSegment::ALL {
            assert_eq!(MacroSegment::from_label(segment.label()), Some(segment));
        }
        assert_eq!(MacroSegment::from_label("Hotel"), None);
    }

    #[test]
    fn brick_segments() {
        assert!(MacroSegment::Logistics.is_brick());
        assert!(MacroSegment::Shopping.is_brick());
        assert!(MacroSegment::Offices.is_brick());
        assert!(!MacroSegment::PapersCri.is_brick());
        assert!(!MacroSegment::FundOfFunds.is_brick());
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&MacroSegment::PapersCri).unwrap();
        assert_eq!(json, "\"Papéis / CRI\"");
    }

    #[test]
    fn new_fund_has_no_metrics() {
        let fund = Fund::new("MXRF11", 10.0);
        assert_eq!(fund.ticker, "MXRF11");
        assert!(fund.dividend_yield.is_none());
        assert!(fund.macro_segment.is_none());
    }
}
