//! Detector thresholds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid detector parameter {name}: {reason}")]
pub struct InvalidParams {
    pub name: &'static str,
    pub reason: String,
}

/// Every tunable of the signal detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Series shorter than this produce no signals.
    pub min_candles: usize,
    /// Index of the first candle evaluated (clamped to `[1, n-1]`).
    pub first_index: usize,

    pub baseline_min_window: usize,
    pub baseline_max_window: usize,

    /// Aggressive candles must close within this fraction of the range from the extreme.
    pub close_position_frac: f64,
    pub aggressive_volume_mult: f64,
    /// An aggressive kind cannot repeat within this many prior candles.
    pub aggressive_cooldown: usize,

    pub absorption_volume_mult: f64,
    /// Candles after the trigger searched for the confirming close.
    pub absorption_lookahead: usize,

    pub breakout_lookback: usize,
    pub breakout_volume_mult: f64,
    pub breakout_cooldown: usize,

    /// POI candles need a body larger than this fraction of their range.
    pub poi_body_frac: f64,
    pub poi_volume_mult: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            min_candles: 4,
            first_index: 3,
            baseline_min_window: 5,
            baseline_max_window: 20,
            close_position_frac: 0.1,
            aggressive_volume_mult: 2.0,
            aggressive_cooldown: 9,
            absorption_volume_mult: 1.2,
            absorption_lookahead: 5,
            breakout_lookback: 10,
            breakout_volume_mult: 1.8,
            breakout_cooldown: 8,
            poi_body_frac: 0.7,
            poi_volume_mult: 2.0,
        }
    }
}

impl DetectorParams {
    pub fn validate(&self) -> Result<(), InvalidParams> {
        let positive = [
            ("aggressive_volume_mult", self.aggressive_volume_mult),
            ("absorption_volume_mult", self.absorption_volume_mult),
            ("breakout_volume_mult", self.breakout_volume_mult),
            ("poi_volume_mult", self.poi_volume_mult),
            ("poi_body_frac", self.poi_body_frac),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(InvalidParams {
                    name,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        if !(0.0..1.0).contains(&self.close_position_frac) {
            return Err(InvalidParams {
                name: "close_position_frac",
                reason: format!("must be in [0, 1), got {}", self.close_position_frac),
            });
        }

        let windows = [
            ("min_candles", self.min_candles),
            ("first_index", self.first_index),
            ("baseline_min_window", self.baseline_min_window),
            ("absorption_lookahead", self.absorption_lookahead),
            ("breakout_lookback", self.breakout_lookback),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(InvalidParams {
                    name,
                    reason: "must be at least 1".into(),
                });
            }
        }
        if self.baseline_max_window < self.baseline_min_window {
            return Err(InvalidParams {
                name: "baseline_max_window",
                reason: format!(
                    "{} is below baseline_min_window {}",
                    self.baseline_max_window, self.baseline_min_window
                ),
            });
        }
        Ok(())
    }
}
