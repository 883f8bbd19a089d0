//! Quantexo Core: candle series, ingestion, volume baseline, signal
//! detection and portfolio metrics.
//!
//! - Domain types (candles, series, signal kinds, scan results)
//! - Data providers (published price sheet, CSV files, in-memory) and the
//!   ingest pipeline that turns raw rows into validated series
//! - Indicators feeding the detector (volume baseline, prior extremes)
//! - The single-pass signal detector
//! - Portfolio valuation over holdings, transactions and dividends

pub mod data;
pub mod detect;
pub mod domain;
pub mod indicators;
pub mod portfolio;

pub use detect::{Detection, DetectorParams, SignalDetector};
pub use domain::{Candle, CandleSeries, ScanResult, SignalKind};
