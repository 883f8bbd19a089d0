//! Progress reporting for batch scans.

use quantexo_core::domain::SignalKind;
use tracing::{debug, info, warn};

use crate::scan::ScanSummary;

/// What happened to one symbol of a batch scan.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    /// The most recent signal in the window.
    Signal(SignalKind),
    NoSignal,
    /// Fewer candles than `scan.min_candles` in the window.
    TooShort { candles: usize },
    /// No rows survived cleaning.
    Empty,
    Failed(String),
    Cancelled,
}

/// Callback for batch-scan progress. Called from worker threads.
pub trait ScanProgress: Send + Sync {
    /// Called before a symbol is fetched.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol is done, whatever the outcome.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, outcome: &SymbolOutcome);

    /// Called once after the last symbol.
    fn on_batch_complete(&self, summary: &ScanSummary);
}

/// Reports through `tracing`.
pub struct LogProgress;

impl ScanProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        debug!("[{}/{}] scanning {symbol}", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, index: usize, total: usize, outcome: &SymbolOutcome) {
        match outcome {
            SymbolOutcome::Signal(kind) => {
                info!("[{}/{}] {symbol}: {} {}", index + 1, total, kind.glyph(), kind.label())
            }
            SymbolOutcome::Failed(message) => {
                warn!("[{}/{}] {symbol}: skipped: {message}", index + 1, total)
            }
            other => debug!("[{}/{}] {symbol}: {other:?}", index + 1, total),
        }
    }

    fn on_batch_complete(&self, summary: &ScanSummary) {
        info!(
            total = summary.total,
            scanned = summary.scanned,
            with_signal = summary.with_signal,
            skipped_empty = summary.skipped_empty,
            failed = summary.failed.len(),
            cancelled = summary.cancelled,
            "batch scan complete"
        );
    }
}

/// Discards every event.
pub struct NoProgress;

impl ScanProgress for NoProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}

    fn on_complete(&self, _symbol: &str, _index: usize, _total: usize, _outcome: &SymbolOutcome) {
    }

    fn on_batch_complete(&self, _summary: &ScanSummary) {}
}
