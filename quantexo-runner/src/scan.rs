//! Scan orchestration.
//!
//! Two entry points:
//! - `scan_symbol()`: ingest and detect over one symbol's full history. Used
//!   for charting and the `detect` command.
//! - `scan_universe()`: best-effort batch over a sector universe. Each symbol
//!   is truncated to the most recent `scan.batch_window` candles and reduced
//!   to its latest signal. One symbol's failure never aborts the batch.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use quantexo_core::data::{
    ingest, CandleProvider, DataSource, FetchError, IngestReport, Ingested, SectorMap, Strictness,
    UniverseError, ValidationError,
};
use quantexo_core::detect::{Detection, SignalDetector};
use quantexo_core::domain::{CandleSeries, ScanResult};

use crate::config::QuantexoConfig;
use crate::progress::{ScanProgress, SymbolOutcome};

/// Errors from a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("validation error: {0}")]
    Validation(ValidationError),
    #[error("no data for symbol '{symbol}'")]
    EmptyData { symbol: String },
    #[error("scan cancelled")]
    Cancelled,
    #[error(transparent)]
    Universe(#[from] UniverseError),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

impl ScanError {
    /// Empty data is skipped in batch mode without a warning.
    pub fn is_silent_skip(&self) -> bool {
        matches!(self, ScanError::EmptyData { .. })
    }
}

impl From<ValidationError> for ScanError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::Empty { symbol } => ScanError::EmptyData { symbol },
            other => ScanError::Validation(other),
        }
    }
}

/// Output of a single-symbol scan.
#[derive(Debug, Clone)]
pub struct SymbolScan {
    pub detection: Detection,
    pub report: IngestReport,
    /// BLAKE3 fingerprint of the cleaned input series.
    pub dataset_hash: String,
    pub source: DataSource,
}

impl SymbolScan {
    pub fn series(&self) -> &CandleSeries {
        &self.detection.series
    }

    pub fn signals(&self) -> &[ScanResult] {
        &self.detection.signals
    }
}

/// Which symbols a batch scan covers.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    /// Every symbol of the sector map.
    All,
    /// The members of one sector (case-insensitive name).
    Sector(&'a str),
    /// An explicit list; symbols outside the map get no sector.
    Symbols(&'a [String]),
}

/// Counters for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    /// Symbols that reached detection.
    pub scanned: usize,
    pub with_signal: usize,
    pub skipped_empty: usize,
    pub skipped_short: usize,
    /// `(symbol, message)` for every symbol skipped with a warning.
    pub failed: Vec<(String, String)>,
    pub cancelled: bool,
}

/// Results of a batch scan, newest first.
#[derive(Debug, Clone, Default)]
pub struct UniverseScan {
    pub results: Vec<ScanResult>,
    pub summary: ScanSummary,
}

/// What a batch scan learned about one symbol.
enum WindowScan {
    Signal(ScanResult),
    NoSignal,
    TooShort(usize),
}

/// Fetch, ingest and detect one symbol over its full history.
///
/// Uses `scan.single_strictness`; errors reach the caller with their
/// diagnostics intact.
pub fn scan_symbol(
    provider: &dyn CandleProvider,
    symbol: &str,
    config: &QuantexoConfig,
) -> Result<SymbolScan, ScanError> {
    let symbol = normalize_symbol(symbol);
    let Ingested { series, report } =
        load_series(provider, &symbol, config.scan.single_strictness)?;
    let dataset_hash = series.fingerprint();
    let detection = SignalDetector::new(config.detector.clone()).detect(&series);
    debug!(
        symbol = %symbol,
        candles = detection.series.len(),
        signals = detection.signals.len(),
        dataset = %dataset_hash,
        provider = provider.name(),
        "single-symbol scan"
    );
    Ok(SymbolScan {
        detection,
        report,
        dataset_hash,
        source: provider.source(),
    })
}

/// Scan a universe of symbols, keeping each symbol's latest signal.
///
/// Fails only when the selection itself is invalid (unknown sector) or the
/// worker pool cannot be built. Cancellation is checked before each symbol;
/// a cancelled scan returns what it collected with `summary.cancelled` set.
pub fn scan_universe(
    provider: &dyn CandleProvider,
    sectors: &SectorMap,
    selection: Selection<'_>,
    config: &QuantexoConfig,
    progress: &dyn ScanProgress,
    cancel: Option<&AtomicBool>,
) -> Result<UniverseScan, ScanError> {
    let symbols: Vec<String> = match selection {
        Selection::All => sectors.all_symbols(),
        Selection::Sector(name) => sectors.sector_symbols(name)?.to_vec(),
        Selection::Symbols(list) => {
            let mut list: Vec<String> = list.iter().map(|s| normalize_symbol(s)).collect();
            list.sort();
            list.dedup();
            list
        }
    };
    let total = symbols.len();
    let detector = SignalDetector::new(config.detector.clone());
    info!(provider = provider.name(), symbols = total, "starting universe scan");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.scan.threads)
        .build()
        .map_err(|e| ScanError::ThreadPool(e.to_string()))?;

    let outcomes: Vec<(&String, Result<WindowScan, ScanError>)> = pool.install(|| {
        symbols
            .par_iter()
            .enumerate()
            .map(|(index, symbol)| {
                if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                    return (symbol, Err(ScanError::Cancelled));
                }
                progress.on_start(symbol, index, total);
                let result = scan_window(provider, symbol, sectors, &detector, config);
                progress.on_complete(symbol, index, total, &outcome_of(&result));
                (symbol, result)
            })
            .collect()
    });

    let mut summary = ScanSummary {
        total,
        ..ScanSummary::default()
    };
    let mut results = Vec::new();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(WindowScan::Signal(result)) => {
                summary.scanned += 1;
                summary.with_signal += 1;
                results.push(result);
            }
            Ok(WindowScan::NoSignal) => summary.scanned += 1,
            Ok(WindowScan::TooShort(candles)) => {
                debug!(symbol = %symbol, candles, "too few candles; skipped");
                summary.skipped_short += 1;
            }
            Err(ScanError::Cancelled) => summary.cancelled = true,
            Err(e) if e.is_silent_skip() => summary.skipped_empty += 1,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                summary.failed.push((symbol.clone(), e.to_string()));
            }
        }
    }

    sort_newest_first(&mut results);
    progress.on_batch_complete(&summary);
    Ok(UniverseScan { results, summary })
}

/// Date descending, then symbol ascending.
pub fn sort_newest_first(results: &mut [ScanResult]) {
    results.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.symbol.cmp(&b.symbol)));
}

fn scan_window(
    provider: &dyn CandleProvider,
    symbol: &str,
    sectors: &SectorMap,
    detector: &SignalDetector,
    config: &QuantexoConfig,
) -> Result<WindowScan, ScanError> {
    let Ingested { series, .. } = load_series(provider, symbol, config.scan.batch_strictness)?;
    let window = series.tail(config.scan.batch_window);
    if window.len() < config.scan.min_candles {
        return Ok(WindowScan::TooShort(window.len()));
    }
    let detection = detector.detect(&window);
    Ok(match detection.latest() {
        Some(latest) => {
            WindowScan::Signal(latest.clone().with_sector(sectors.sector_of(symbol)))
        }
        None => WindowScan::NoSignal,
    })
}

fn load_series(
    provider: &dyn CandleProvider,
    symbol: &str,
    strictness: Strictness,
) -> Result<Ingested, ScanError> {
    let rows = provider.fetch_daily(symbol)?;
    if rows.is_empty() {
        return Err(ScanError::EmptyData {
            symbol: symbol.to_string(),
        });
    }
    Ok(ingest(symbol, &rows, strictness)?)
}

fn outcome_of(result: &Result<WindowScan, ScanError>) -> SymbolOutcome {
    match result {
        Ok(WindowScan::Signal(r)) => SymbolOutcome::Signal(r.tag),
        Ok(WindowScan::NoSignal) => SymbolOutcome::NoSignal,
        Ok(WindowScan::TooShort(candles)) => SymbolOutcome::TooShort { candles: *candles },
        Err(ScanError::Cancelled) => SymbolOutcome::Cancelled,
        Err(e) if e.is_silent_skip() => SymbolOutcome::Empty,
        Err(e) => SymbolOutcome::Failed(e.to_string()),
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use quantexo_core::data::{MemoryProvider, RawRow};
    use quantexo_core::domain::SignalKind;

    fn result(symbol: &str, day: u32) -> ScanResult {
        ScanResult {
            symbol: symbol.into(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            tag: SignalKind::AggressiveBuying,
            price: None,
            volume: None,
            sector: None,
        }
    }

    #[test]
    fn sort_is_date_desc_then_symbol() {
        let mut results = vec![result("B", 1), result("C", 2), result("A", 1)];
        sort_newest_first(&mut results);
        let order: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn empty_validation_becomes_empty_data() {
        let err: ScanError = ValidationError::Empty {
            symbol: "NABIL".into(),
        }
        .into();
        assert!(err.is_silent_skip());
        let err: ScanError = ValidationError::Csv("bad".into()).into();
        assert!(!err.is_silent_skip());
    }

    #[test]
    fn single_symbol_missing_is_empty_data() {
        let provider = MemoryProvider::new();
        let err = scan_symbol(&provider, "nabil", &QuantexoConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::EmptyData { symbol } if symbol == "NABIL"));
    }

    #[test]
    fn single_symbol_records_source_and_fingerprint() {
        let rows: Vec<RawRow> = (1..=5)
            .map(|d| RawRow::from_values(&format!("2024-01-0{d}"), "X", 1.0, 1.0, 1.0, 1.0, 1.0))
            .collect();
        let provider = MemoryProvider::new().with("X", rows);
        let scan = scan_symbol(&provider, "x", &QuantexoConfig::default()).unwrap();
        assert_eq!(scan.source, DataSource::Memory);
        assert_eq!(scan.dataset_hash, scan.series().fingerprint());
    }

    #[test]
    fn single_symbol_strict_surfaces_bad_numbers() {
        let mut rows: Vec<RawRow> = (1..=5)
            .map(|d| RawRow::from_values(&format!("2024-01-0{d}"), "X", 1.0, 1.0, 1.0, 1.0, 1.0))
            .collect();
        rows[2].close = "n/a".into();
        let provider = MemoryProvider::new().with("X", rows);
        let err = scan_symbol(&provider, "X", &QuantexoConfig::default()).unwrap_err();
        match err {
            ScanError::Validation(ValidationError::InvalidNumbers { column, count, .. }) => {
                assert_eq!(column, "close");
                assert_eq!(count, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
