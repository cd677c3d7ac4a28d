//! Fundamentus FII listing provider.
//!
//! Downloads the public listing page and lifts its first HTML table into a
//! raw snapshot. Handles retries with exponential backoff for transient
//! failures. The page has no stable API and its layout may drift, so any
//! structural surprise is reported as `ResponseFormatChanged`.

use regex::Regex;
use std::time::Duration;

use super::provider::{DataError, SnapshotProvider, SnapshotSource};
use super::snapshot::RawSnapshot;

pub const DEFAULT_URL: &str = "https://www.fundamentus.com.br/fii_resultado.php";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Bodies shorter than this are treated as an empty response.
const MIN_BODY_LEN: usize = 100;

/// Connection settings for the listing page.
#[derive(Debug, Clone)]
pub struct FundamentusSettings {
    pub url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for FundamentusSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Fundamentus listing provider.
pub struct FundamentusProvider {
    client: reqwest::blocking::Client,
    settings: FundamentusSettings,
    extractor: TableExtractor,
}

impl FundamentusProvider {
    pub fn new(settings: FundamentusSettings) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            settings,
            extractor: TableExtractor::new()?,
        })
    }

    /// GET the listing page, retrying transient failures.
    fn fetch_body(&self) -> Result<String, DataError> {
        let url = &self.settings.url;
        let mut last_error = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let delay = self.settings.base_delay * 2u32.pow(attempt - 1);
                tracing::warn!(attempt, ?delay, "retrying Fundamentus download");
                std::thread::sleep(delay);
            }

            let error = match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .text()
                            .map_err(|e| DataError::NetworkUnreachable(e.to_string()));
                    }
                    DataError::HttpStatus {
                        status: status.as_u16(),
                        url: url.clone(),
                    }
                }
                Err(e) => DataError::NetworkUnreachable(e.to_string()),
            };

            if !error.is_retryable() {
                return Err(error);
            }
            last_error = Some(error);
        }

        Err(last_error
            .unwrap_or_else(|| DataError::NetworkUnreachable("max retries exceeded".into())))
    }
}

impl SnapshotProvider for FundamentusProvider {
    fn name(&self) -> &str {
        "fundamentus"
    }

    fn fetch(&self) -> Result<RawSnapshot, DataError> {
        let body = self.fetch_body()?;
        let (headers, rows) = self.extractor.extract(&body)?;
        tracing::info!(rows = rows.len(), "Fundamentus listing downloaded");
        RawSnapshot::from_text_rows(&headers, &rows, SnapshotSource::Fundamentus)
    }
}

/// Pulls the first `<table>` out of an HTML page as text cells.
///
/// Numbers in pt-BR notation (`1.234,56`) are rewritten to `1234.56`;
/// anything else, percentages included, is kept as text.
pub struct TableExtractor {
    table: Regex,
    row: Regex,
    header_cell: Regex,
    data_cell: Regex,
    tag: Regex,
    locale_number: Regex,
}

impl TableExtractor {
    pub fn new() -> Result<Self, DataError> {
        let re = |pattern: &str| {
            Regex::new(pattern).map_err(|e| DataError::IngestFailed(format!("pattern: {e}")))
        };
        Ok(Self {
            table: re(r"(?is)<table\b[^>]*>(.*?)</table>")?,
            row: re(r"(?is)<tr\b[^>]*>(.*?)</tr>")?,
            header_cell: re(r"(?is)<th\b[^>]*>(.*?)</th>")?,
            data_cell: re(r"(?is)<td\b[^>]*>(.*?)</td>")?,
            tag: re(r"(?s)<[^>]*>")?,
            locale_number: re(r"^-?(?:\d{1,3}(?:\.\d{3})+|\d+)(?:,\d+)?$")?,
        })
    }

    /// Header labels and data rows of the first table in `html`.
    #[allow(clippy::type_complexity)]
    pub fn extract(&self, html: &str) -> Result<(Vec<String>, Vec<Vec<Option<String>>>), DataError> {
        if html.len() < MIN_BODY_LEN {
            return Err(DataError::ResponseFormatChanged(
                "empty response body".into(),
            ));
        }

        let table = self
            .table
            .captures(html)
            .and_then(|c| c.get(1))
            .ok_or_else(|| DataError::ResponseFormatChanged("no table found in page".into()))?
            .as_str();

        let headers: Vec<String> = self
            .header_cell
            .captures_iter(table)
            .filter_map(|c| c.get(1))
            .map(|m| self.cell_text(m.as_str()))
            .collect();
        if headers.is_empty() {
            return Err(DataError::ResponseFormatChanged(
                "table has no header row".into(),
            ));
        }

        let rows: Vec<Vec<Option<String>>> = self
            .row
            .captures_iter(table)
            .filter_map(|c| c.get(1))
            .map(|row| {
                self.data_cell
                    .captures_iter(row.as_str())
                    .filter_map(|c| c.get(1))
                    .map(|m| self.cell_value(m.as_str()))
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();

        Ok((headers, rows))
    }

    fn cell_text(&self, raw: &str) -> String {
        let stripped = self.tag.replace_all(raw, "");
        html_escape::decode_html_entities(&stripped)
            .replace('\u{a0}', " ")
            .trim()
            .to_string()
    }

    fn cell_value(&self, raw: &str) -> Option<String> {
        let text = self.cell_text(raw);
        if text.is_empty() {
            return None;
        }
        if self.locale_number.is_match(&text) {
            return Some(text.replace('.', "").replacen(',', ".", 1));
        }
        Some(text)
    }
}
