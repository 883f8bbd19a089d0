//! Quantexo Runner: scan orchestration, configuration, export, portfolio loading.
//!
//! This crate builds on `quantexo-core` to provide:
//! - Single-symbol scans over the full history, for charting
//! - Parallel, cancellable universe scans keeping each symbol's latest signal
//! - TOML configuration for data access, detector thresholds and export
//! - CSV export/import of scan results with timestamped file names
//! - Portfolio valuation from local files or public sheet tabs

pub mod config;
pub mod export;
pub mod portfolio_loader;
pub mod progress;
pub mod scan;

pub use config::{ConfigError, DataConfig, ExportConfig, QuantexoConfig, ScanConfig};
pub use export::{
    export_filename, export_scan_csv, export_signals_csv, import_scan_csv, save_scan_export,
};
pub use portfolio_loader::{
    load_portfolio, LoadedPortfolio, PortfolioLoadError, PortfolioSources, TableSource,
};
pub use progress::{LogProgress, NoProgress, ScanProgress, SymbolOutcome};
pub use scan::{
    scan_symbol, scan_universe, sort_newest_first, ScanError, ScanSummary, Selection, SymbolScan,
    UniverseScan,
};
