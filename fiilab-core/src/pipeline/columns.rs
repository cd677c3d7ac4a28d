//! Column label normalization.
//!
//! Turns human-formatted headers ("Dividend Yield", "Vacância Média",
//! "P/VP") into canonical machine-safe identifiers ("dividend_yield",
//! "vacancia_media", "p_vp"). The transform is idempotent and applies to
//! every label alike; there is no per-column special-casing.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::PipelineError;
use crate::data::RawSnapshot;

/// Decompose and drop combining marks: "vacância" -> "vacancia".
pub fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Canonical identifier for one raw label.
///
/// Trim, lowercase, strip accents, whitespace -> `_`, drop `%`, `/` -> `_`.
pub fn normalize_label(label: &str) -> String {
    strip_accents(&label.trim().to_lowercase())
        .chars()
        .filter(|&c| c != '%')
        .map(|c| if c.is_whitespace() || c == '/' { '_' } else { c })
        .collect()
}

/// Normalize every label, in order.
pub fn normalize_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    labels.iter().map(|l| normalize_label(l.as_ref())).collect()
}

/// Rename a snapshot's columns to their canonical identifiers.
///
/// Fails if two raw labels collapse onto the same identifier.
pub fn normalize_columns(snapshot: &RawSnapshot) -> Result<RawSnapshot, PipelineError> {
    let names = normalize_labels(&snapshot.column_names());

    let mut seen = std::collections::HashSet::with_capacity(names.len());
    if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
        return Err(PipelineError::DuplicateColumn(dup.clone()));
    }

    Ok(snapshot.with_column_names(&names)?)
}
