//! Table export: CSV, JSON, and Markdown.
//!
//! Two views are exported:
//! - **Passed**: the screened funds, with the full display column set
//! - **Peers**: similarity results, with the shorter peer column set
//!
//! CSV and Markdown headers use the friendly column labels; JSON keys use
//! the canonical identifiers. Absent values are empty in CSV, `null` in
//! JSON, and `-` in Markdown.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use fiilab_core::domain::{schema, ScoredFund, ScoredTable};

/// Which column set to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportView {
    Passed,
    Peers,
}

impl ExportView {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Passed => &schema::DISPLAY_COLUMNS,
            Self::Peers => &schema::PEER_COLUMNS,
        }
    }
}

/// One exported cell.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Score(u8),
    Absent,
}

impl Cell {
    fn text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(v) => format!("{v:.2}"),
            Self::Score(s) => s.to_string(),
            Self::Absent => String::new(),
        }
    }

    fn json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Self::Score(s) => Value::from(*s),
            Self::Absent => Value::Null,
        }
    }
}

fn cell(f: &ScoredFund, column: &str) -> Cell {
    let number = |v: Option<f64>| v.map_or(Cell::Absent, Cell::Number);
    let fund = &f.fund;
    match column {
        schema::TICKER => Cell::Text(fund.ticker.clone()),
        schema::SEGMENT => fund.segment.clone().map_or(Cell::Absent, Cell::Text),
        schema::MACRO_SEGMENT => fund
            .macro_segment
            .map_or(Cell::Absent, |m| Cell::Text(m.label().to_string())),
        schema::PRICE => Cell::Number(fund.price),
        schema::DY_PCT => number(fund.dy_pct),
        schema::FFO_PCT => number(fund.ffo_pct),
        schema::VACANCY_PCT => number(fund.vacancy_pct),
        schema::P_VP => number(fund.p_vp),
        schema::LIQUIDITY => number(fund.liquidity),
        schema::MARKET_VALUE => number(fund.market_value),
        schema::SCORE => Cell::Score(f.score()),
        _ => Cell::Absent,
    }
}

/// Columns of `view` that the table actually carries, in view order.
fn present_columns(table: &ScoredTable, view: ExportView) -> Vec<&'static str> {
    view.columns()
        .iter()
        .copied()
        .filter(|c| table.has_column(c))
        .collect()
}

// ─── CSV ────────────────────────────────────────────────────────────

pub fn export_csv(table: &ScoredTable, view: ExportView) -> Result<String> {
    let columns = present_columns(table, view);
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(columns.iter().map(|c| schema::display_name(c)))?;
    for f in table.funds() {
        wtr.write_record(columns.iter().map(|c| cell(f, c).text()))?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(table: &ScoredTable, view: ExportView) -> Result<String> {
    let columns = present_columns(table, view);
    let records: Vec<Value> = table
        .funds()
        .iter()
        .map(|f| {
            let record: Map<String, Value> = columns
                .iter()
                .map(|c| (c.to_string(), cell(f, c).json()))
                .collect();
            Value::Object(record)
        })
        .collect();
    serde_json::to_string_pretty(&records).context("failed to serialize table to JSON")
}

// ─── Markdown ───────────────────────────────────────────────────────

pub fn export_markdown(table: &ScoredTable, view: ExportView) -> String {
    let columns = present_columns(table, view);
    let mut md = String::with_capacity(64 * (table.len() + 2));

    let headers: Vec<&str> = columns.iter().map(|c| schema::display_name(c)).collect();
    md.push_str(&format!("| {} |\n", headers.join(" | ")));
    md.push_str(&format!("|{}\n", " --- |".repeat(columns.len())));

    for f in table.funds() {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| match cell(f, c) {
                Cell::Absent => "-".to_string(),
                other => other.text().replace('|', "\\|"),
            })
            .collect();
        md.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    md
}

// ─── Files ──────────────────────────────────────────────────────────

/// Write `{stem}.csv`, `{stem}.json` and `{stem}.md` under `output_dir`.
///
/// Returns the written paths.
pub fn save_exports(
    table: &ScoredTable,
    view: ExportView,
    output_dir: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create export dir: {}", output_dir.display()))?;

    let outputs = [
        ("csv", export_csv(table, view)?),
        ("json", export_json(table, view)?),
        ("md", export_markdown(table, view)),
    ];

    let mut paths = Vec::with_capacity(outputs.len());
    for (ext, body) in outputs {
        let path = output_dir.join(format!("{stem}.{ext}"));
        std::fs::write(&path, body)
            .with_context(|| format!("failed to write {}", path.display()))?;
        paths.push(path);
    }
    tracing::info!(rows = table.len(), dir = %output_dir.display(), "exports written");
    Ok(paths)
}

/// Default export stem: `{prefix}_{YYYYmmdd_HHMMSS}`.
pub fn timestamped_stem(prefix: &str) -> String {
    format!("{prefix}_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiilab_core::domain::{Fund, FundTable, MacroSegment};
    use fiilab_core::scoring::{score, ScoringThresholds};

    fn scored() -> ScoredTable {
        let full = Fund {
            segment: Some("Logística".into()),
            macro_segment: Some(MacroSegment::Logistics),
            dy_pct: Some(8.1),
            p_vp: Some(0.95),
            liquidity: Some(6_500_000.0),
            vacancy_pct: Some(3.2),
            market_value: Some(4.8e9),
            ..Fund::new("HGLG11", 160.5)
        };
        let sparse = Fund {
            segment: Some("Shoppings".into()),
            macro_segment: Some(MacroSegment::Shopping),
            ..Fund::new("XPML11", 110.2)
        };
        let table = FundTable::new(
            vec![full, sparse],
            [
                "papel",
                "segmento",
                "macro_segmento",
                "cotacao",
                "dy_pct",
                "p_vp",
                "liquidez",
                "vacancia_pct",
                "valor_de_mercado",
            ],
        );
        score(&table, &ScoringThresholds::beginner())
    }

    #[test]
    fn csv_uses_friendly_headers() {
        let csv = export_csv(&scored(), ExportView::Passed).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Fundo,Macro Segmento,Segmento,Cotação (R$)"));
        assert!(header.ends_with("Score"));

        let first = lines.next().unwrap();
        assert!(first.starts_with("HGLG11,Logístico,Logística,160.50,8.10,0.95"));
        assert!(first.ends_with(",5"));

        let second = lines.next().unwrap();
        assert_eq!(second, "XPML11,Shoppings,Shoppings,110.20,,,,,,0");
    }

    #[test]
    fn peer_view_has_fewer_columns() {
        let csv = export_csv(&scored(), ExportView::Peers).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "Fundo,Segmento,Dividend Yield (%),P/VP,Liquidez (R$/dia),Score"
        );
    }

    #[test]
    fn json_uses_null_for_absent() {
        let json = export_json(&scored(), ExportView::Peers).unwrap();
        let records: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["papel"], "HGLG11");
        assert_eq!(records[0]["score"], 5);
        assert_eq!(records[0]["dy_pct"], 8.1);
        assert!(records[1]["dy_pct"].is_null());
    }

    #[test]
    fn markdown_table_shape() {
        let md = export_markdown(&scored(), ExportView::Peers);
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "| --- | --- | --- | --- | --- | --- |");
        assert!(lines[3].starts_with("| XPML11 | Shoppings | - |"));
    }

    #[test]
    fn columns_missing_from_table_are_skipped() {
        let table = FundTable::new(vec![Fund::new("AAAA11", 10.0)], ["papel", "cotacao"]);
        let scored = score(&table, &ScoringThresholds::advanced());
        let csv = export_csv(&scored, ExportView::Passed).unwrap();
        assert_eq!(csv.lines().next().unwrap(), "Fundo,Cotação (R$),Score");
    }

    #[test]
    fn saves_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = save_exports(&scored(), ExportView::Passed, dir.path(), "fiis").unwrap();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert!(path.exists());
        }
        assert!(dir.path().join("fiis.md").exists());
    }

    #[test]
    fn stem_has_prefix() {
        assert!(timestamped_stem("peers").starts_with("peers_"));
    }
}
