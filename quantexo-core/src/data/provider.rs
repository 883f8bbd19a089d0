//! Candle provider trait and structured fetch errors.
//!
//! The CandleProvider trait abstracts over data sources (the published
//! daily-price sheet, a local CSV export, an in-memory map) so the scan
//! orchestrator can swap implementations and tests can mock them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::ingest::ValidationError;

/// One daily row exactly as read from the source, before coercion.
///
/// All fields are kept as text; `ingest` owns date parsing and numeric
/// coercion so every provider gets the same cleaning rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: String,
    pub symbol: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl RawRow {
    /// Convenience constructor for numeric test data.
    pub fn from_values(
        date: &str,
        symbol: &str,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date: date.to_string(),
            symbol: symbol.to_string(),
            open: open.to_string(),
            high: high.to_string(),
            low: low.to_string(),
            close: close.to_string(),
            volume: volume.to_string(),
        }
    }
}

/// Errors raised while fetching a symbol's rows.
///
/// Designed to be displayable in CLI output and per-symbol scan warnings.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP {status} from {provider}")]
    HttpStatus { provider: String, status: u16 },

    #[error("hard stop: data source is refusing requests (circuit breaker open, {remaining_secs}s left)")]
    CircuitOpen { remaining_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed source data: {0}")]
    Schema(#[from] ValidationError),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Sheet,
    CsvFile,
    Memory,
}

/// Source of daily candle rows for a symbol.
///
/// Implementations return an empty vector (not an error) when the symbol has
/// no rows, and a [`FetchError`] when the source itself is unusable.
pub trait CandleProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Fetch every available daily row for `symbol`.
    fn fetch_daily(&self, symbol: &str) -> Result<Vec<RawRow>, FetchError>;
}

/// In-memory provider keyed by upper-cased symbol.
#[derive(Debug, Default, Clone)]
pub struct MemoryProvider {
    rows: HashMap<String, Vec<RawRow>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, rows: Vec<RawRow>) {
        self.rows.insert(symbol.trim().to_uppercase(), rows);
    }

    pub fn with(mut self, symbol: &str, rows: Vec<RawRow>) -> Self {
        self.insert(symbol, rows);
        self
    }
}

impl CandleProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn source(&self) -> DataSource {
        DataSource::Memory
    }

    fn fetch_daily(&self, symbol: &str) -> Result<Vec<RawRow>, FetchError> {
        Ok(self
            .rows
            .get(&symbol.trim().to_uppercase())
            .cloned()
            .unwrap_or_default())
    }
}

/// Keep only rows for `symbol` (trimmed, case-insensitive).
///
/// Rows with an empty symbol are kept: a single-symbol export has no symbol
/// column at all.
pub fn filter_symbol(rows: &[RawRow], symbol: &str) -> Vec<RawRow> {
    let wanted = symbol.trim().to_uppercase();
    rows.iter()
        .filter(|r| {
            let s = r.symbol.trim();
            s.is_empty() || s.to_uppercase() == wanted
        })
        .cloned()
        .map(|mut r| {
            r.symbol = wanted.clone();
            r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_provider_is_case_insensitive() {
        let provider = MemoryProvider::new().with(
            "nabil",
            vec![RawRow::from_values("2024-01-01", "NABIL", 1.0, 1.0, 1.0, 1.0, 1.0)],
        );
        assert_eq!(provider.fetch_daily(" Nabil ").unwrap().len(), 1);
    }

    #[test]
    fn memory_provider_missing_symbol_is_empty_not_error() {
        let provider = MemoryProvider::new();
        assert!(provider.fetch_daily("NOPE").unwrap().is_empty());
    }

    #[test]
    fn filter_symbol_normalises_case_and_whitespace() {
        let rows = vec![
            RawRow::from_values("2024-01-01", " nabil ", 1.0, 1.0, 1.0, 1.0, 1.0),
            RawRow::from_values("2024-01-01", "NICA", 1.0, 1.0, 1.0, 1.0, 1.0),
            RawRow::from_values("2024-01-02", "NABIL", 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        let kept = filter_symbol(&rows, "Nabil");
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.symbol == "NABIL"));
    }

    #[test]
    fn filter_symbol_keeps_symbolless_rows() {
        let rows = vec![RawRow::from_values("2024-01-01", "", 1.0, 1.0, 1.0, 1.0, 1.0)];
        let kept = filter_symbol(&rows, "ADBL");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].symbol, "ADBL");
    }
}
