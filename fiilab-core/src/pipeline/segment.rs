//! Macro-segment classification of free-text segment labels.
//!
//! Rules are checked in a fixed priority order and the first match wins,
//! so "Papel / Shopping" is Papers/CRI.

use super::columns::strip_accents;
use crate::domain::{schema, Fund, FundTable, MacroSegment};

const FOF_KEYWORDS: [&str; 4] = ["fundo de fundos", "fii de fiis", "fundo de fii", "fof"];

/// Classify one segment label.
pub fn classify_segment(label: &str) -> MacroSegment {
    let text = strip_accents(&label.to_lowercase());
    let contains = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    // "cri" must start a word: "escritorio" contains "cri" as a substring,
    // and the Papers/CRI rule runs before the Offices rule, so a plain
    // substring check would file every office fund under Papers/CRI.
    let cri_token = text
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word.starts_with("cri"));

    if contains(&["papel", "receb"]) || cri_token {
        MacroSegment::PapersCri
    } else if contains(&["logist"]) {
        MacroSegment::Logistics
    } else if contains(&["shopp"]) {
        MacroSegment::Shopping
    } else if contains(&FOF_KEYWORDS) {
        MacroSegment::FundOfFunds
    } else if contains(&["laje", "escritorio"]) {
        MacroSegment::Offices
    } else {
        MacroSegment::Other
    }
}

/// Attach a macro-segment to every fund.
///
/// Without a segment column every fund is `Unknown`; with one, a blank
/// cell classifies as `Other`.
pub fn classify_segments(table: &FundTable) -> FundTable {
    let has_segment = table.has_column(schema::SEGMENT);
    if !has_segment {
        tracing::debug!("no segment column; all funds marked unknown");
    }

    table.derive(&[schema::MACRO_SEGMENT], |fund| Fund {
        macro_segment: Some(if has_segment {
            classify_segment(fund.segment.as_deref().unwrap_or_default())
        } else {
            MacroSegment::Unknown
        }),
        ..fund.clone()
    })
}
