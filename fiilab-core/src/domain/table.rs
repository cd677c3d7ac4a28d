//! Immutable fund tables passed between pipeline stages.
//!
//! Every stage takes a table by reference and returns a new one; nothing
//! mutates a table another stage can see. The column set records which
//! canonical columns the table carries, so "column absent from the source"
//! stays distinguishable from "cell absent in this row".

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use super::fund::Fund;
use super::schema;

/// Cleaned funds plus the canonical columns they were built from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FundTable {
    funds: Vec<Fund>,
    columns: BTreeSet<String>,
}

impl FundTable {
    /// Build a table, keeping the first row for any repeated ticker.
    pub fn new<I, S>(funds: Vec<Fund>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::with_capacity(funds.len());
        let mut unique = Vec::with_capacity(funds.len());
        for fund in funds {
            if seen.insert(fund.ticker.clone()) {
                unique.push(fund);
            } else {
                tracing::warn!(ticker = %fund.ticker, "duplicate ticker dropped");
            }
        }
        Self {
            funds: unique,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    /// Look up a fund by ticker.
    pub fn get(&self, ticker: &str) -> Option<&Fund> {
        self.funds.iter().find(|f| f.ticker == ticker)
    }

    /// Derive a new table by mapping every row, adding `added` columns.
    pub fn derive<F>(&self, added: &[&str], f: F) -> FundTable
    where
        F: FnMut(&Fund) -> Fund,
    {
        let mut columns = self.columns.clone();
        columns.extend(added.iter().map(|c| c.to_string()));
        FundTable {
            funds: self.funds.iter().map(f).collect(),
            columns,
        }
    }

    /// Keep only the rows matching `predicate`.
    pub fn filter<P>(&self, mut predicate: P) -> FundTable
    where
        P: FnMut(&Fund) -> bool,
    {
        FundTable {
            funds: self.funds.iter().filter(|f| predicate(f)).cloned().collect(),
            columns: self.columns.clone(),
        }
    }

    /// Which of `required` are missing from this table's columns.
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|c| !self.has_column(c))
            .collect()
    }
}

/// Outcome of the five threshold rules for one fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleFlags {
    pub dy_ok: bool,
    pub pvp_ok: bool,
    pub liquidity_ok: bool,
    pub vacancy_ok: bool,
    pub size_ok: bool,
}

impl RuleFlags {
    pub fn as_array(&self) -> [bool; 5] {
        [
            self.dy_ok,
            self.pvp_ok,
            self.liquidity_ok,
            self.vacancy_ok,
            self.size_ok,
        ]
    }

    /// Number of satisfied rules, 0..=5.
    pub fn count(&self) -> u8 {
        self.as_array().iter().filter(|&&b| b).count() as u8
    }
}

/// A fund together with its rule flags.
///
/// The score is never stored; it is always recomputed from the flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFund {
    pub fund: Fund,
    pub flags: RuleFlags,
}

impl ScoredFund {
    pub fn score(&self) -> u8 {
        self.flags.count()
    }
}

/// Output of the scoring engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoredTable {
    funds: Vec<ScoredFund>,
    columns: BTreeSet<String>,
}

impl ScoredTable {
    pub(crate) fn from_parts(funds: Vec<ScoredFund>, columns: BTreeSet<String>) -> Self {
        Self { funds, columns }
    }

    /// Score columns are added to whatever the source table carried.
    pub(crate) fn scored_columns(source: &FundTable) -> BTreeSet<String> {
        let mut columns = source.columns().clone();
        columns.extend(schema::FLAG_COLUMNS.iter().map(|c| c.to_string()));
        columns.insert(schema::SCORE.to_string());
        columns
    }

    pub fn funds(&self) -> &[ScoredFund] {
        &self.funds
    }

    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    pub fn get(&self, ticker: &str) -> Option<&ScoredFund> {
        self.funds.iter().find(|f| f.fund.ticker == ticker)
    }

    /// Tickers in table order.
    pub fn tickers(&self) -> Vec<&str> {
        self.funds.iter().map(|f| f.fund.ticker.as_str()).collect()
    }

    /// Keep only the rows matching `predicate`.
    pub fn filter<P>(&self, mut predicate: P) -> ScoredTable
    where
        P: FnMut(&ScoredFund) -> bool,
    {
        ScoredTable {
            funds: self.funds.iter().filter(|f| predicate(f)).cloned().collect(),
            columns: self.columns.clone(),
        }
    }

    /// Funds whose score is at least `min_score`.
    pub fn with_min_score(&self, min_score: u8) -> ScoredTable {
        self.filter(|f| f.score() >= min_score)
    }
}
