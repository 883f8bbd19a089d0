//! ScanResult: one detected signal, as handed to presentation and export.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::candle::Candle;
use super::signal::SignalKind;

/// A single detected signal for one symbol on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub symbol: String,
    pub date: NaiveDate,
    pub tag: SignalKind,
    /// Close of the tagged candle.
    pub price: Option<f64>,
    pub volume: Option<f64>,
    /// Filled in by the orchestrator from the sector map.
    pub sector: Option<String>,
}

impl ScanResult {
    /// Result for a tagged candle, carrying its close and volume.
    pub fn from_candle(symbol: &str, candle: &Candle, tag: SignalKind) -> Self {
        Self {
            symbol: symbol.to_string(),
            date: candle.date,
            tag,
            price: Some(candle.close),
            volume: Some(candle.volume),
            sector: None,
        }
    }

    pub fn with_sector(mut self, sector: Option<&str>) -> Self {
        self.sector = sector.map(str::to_string);
        self
    }
}
