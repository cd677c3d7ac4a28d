//! Locale-aware numeric parsing.
//!
//! Scraped cells arrive as pt-BR text ("12,86%", "1.234,56") or, when a
//! producer already typed them, as numbers. Every cell is parsed on its
//! own; a cell that cannot be read becomes `None` and never fails the
//! column. Rows without a usable price or identifier are dropped here,
//! once, and nowhere else.

use polars::prelude::*;

use super::PipelineError;
use crate::data::RawSnapshot;
use crate::domain::{schema, Fund, FundTable};

/// One raw cell, as read from a snapshot column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
}

/// Parse a percentage cell into a fraction.
///
/// Numbers pass through untouched (they are assumed to be in the right
/// scale already); text goes through [`parse_percentage_text`].
pub fn parse_percentage(value: RawValue<'_>) -> Option<f64> {
    match value {
        RawValue::Missing => None,
        RawValue::Number(n) => finite(n),
        RawValue::Text(s) => parse_percentage_text(Some(s)),
    }
}

/// Parse pt-BR percentage text into a fraction: `"12,86%"` -> `0.1286`.
///
/// Strips `%`, drops every `.` (thousands), turns the first `,` into the
/// decimal point, then divides by 100.
pub fn parse_percentage_text(text: Option<&str>) -> Option<f64> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    let cleaned = text.replace(['%', '.'], "").replacen(',', ".", 1);
    let value: f64 = cleaned.trim().parse().ok()?;
    finite(value / 100.0)
}

/// Coerce a cell of a plain numeric column.
pub fn coerce_numeric(value: RawValue<'_>) -> Option<f64> {
    match value {
        RawValue::Missing => None,
        RawValue::Number(n) => finite(n),
        RawValue::Text(s) => s.trim().parse().ok().and_then(finite),
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Read every cell of `name` through `f`, or `None` if the column is absent.
fn read_column<T>(
    frame: &DataFrame,
    name: &str,
    f: impl Fn(RawValue<'_>) -> T,
) -> Result<Option<Vec<T>>, PipelineError> {
    let Ok(column) = frame.column(name) else {
        return Ok(None);
    };

    let values = if column.dtype() == &DataType::String {
        column
            .str()?
            .iter()
            .map(|v| f(v.map_or(RawValue::Missing, RawValue::Text)))
            .collect()
    } else {
        let cast = column.cast(&DataType::Float64)?;
        cast.f64()?
            .iter()
            .map(|v| f(v.map_or(RawValue::Missing, RawValue::Number)))
            .collect()
    };
    Ok(Some(values))
}

pub fn percentage_column(
    frame: &DataFrame,
    name: &str,
) -> Result<Option<Vec<Option<f64>>>, PipelineError> {
    read_column(frame, name, parse_percentage)
}

pub fn numeric_column(
    frame: &DataFrame,
    name: &str,
) -> Result<Option<Vec<Option<f64>>>, PipelineError> {
    read_column(frame, name, coerce_numeric)
}

/// Trimmed text cells; blank cells are absent.
pub fn text_column(
    frame: &DataFrame,
    name: &str,
) -> Result<Option<Vec<Option<String>>>, PipelineError> {
    read_column(frame, name, |v| match v {
        RawValue::Missing => None,
        RawValue::Number(n) => Some(n.to_string()),
        RawValue::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
    })
}

fn cell<T: Clone>(column: &Option<Vec<Option<T>>>, row: usize) -> Option<T> {
    column.as_ref().and_then(|c| c.get(row).cloned().flatten())
}

/// Parse a snapshot with canonical column names into typed fund records.
///
/// Every column of the snapshot is recorded as present in the result,
/// including ones the fund record does not carry.
pub fn parse_snapshot(snapshot: &RawSnapshot) -> Result<FundTable, PipelineError> {
    let frame = snapshot.frame();

    let tickers = text_column(frame, schema::TICKER)?
        .ok_or_else(|| PipelineError::MissingColumn(schema::TICKER.to_string()))?;
    let segment = text_column(frame, schema::SEGMENT)?;

    let price = numeric_column(frame, schema::PRICE)?;
    if price.is_none() {
        tracing::warn!("snapshot has no price column; every row will be dropped");
    }
    let p_vp = numeric_column(frame, schema::P_VP)?;
    let market_value = numeric_column(frame, schema::MARKET_VALUE)?;
    let liquidity = numeric_column(frame, schema::LIQUIDITY)?;
    let property_count = numeric_column(frame, schema::PROPERTY_COUNT)?;
    let price_per_m2 = numeric_column(frame, schema::PRICE_PER_M2)?;
    let rent_per_m2 = numeric_column(frame, schema::RENT_PER_M2)?;

    let ffo_yield = percentage_column(frame, schema::FFO_YIELD)?;
    let dividend_yield = percentage_column(frame, schema::DIVIDEND_YIELD)?;
    let cap_rate = percentage_column(frame, schema::CAP_RATE)?;
    let vacancy = percentage_column(frame, schema::VACANCY)?;

    let mut funds = Vec::with_capacity(frame.height());
    let mut no_ticker = 0usize;
    let mut no_price = 0usize;

    for (row, ticker) in tickers.into_iter().enumerate() {
        let Some(ticker) = ticker else {
            no_ticker += 1;
            continue;
        };
        let Some(price) = cell(&price, row) else {
            no_price += 1;
            continue;
        };

        funds.push(Fund {
            segment: cell(&segment, row),
            ffo_yield: cell(&ffo_yield, row),
            dividend_yield: cell(&dividend_yield, row),
            cap_rate: cell(&cap_rate, row),
            vacancy: cell(&vacancy, row),
            p_vp: cell(&p_vp, row),
            market_value: cell(&market_value, row),
            liquidity: cell(&liquidity, row),
            property_count: cell(&property_count, row),
            price_per_m2: cell(&price_per_m2, row),
            rent_per_m2: cell(&rent_per_m2, row),
            ..Fund::new(ticker, price)
        });
    }

    if no_ticker + no_price > 0 {
        tracing::warn!(no_ticker, no_price, "rows dropped during numeric parsing");
    }

    let table = FundTable::new(funds, snapshot.column_names());
    tracing::debug!(
        rows_in = frame.height(),
        rows_out = table.len(),
        "numeric parsing complete"
    );
    Ok(table)
}
