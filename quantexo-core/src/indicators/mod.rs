//! Candle indicators used by the signal detector.
//!
//! Indicators are pure functions: candle history in, numeric series out, one
//! value per candle. Values that cannot be computed yet are `f64::NAN`.
//! No value at index t may depend on candles after t, except where a type
//! documents otherwise (the volume baseline back-fills its warmup).

pub mod prior_extreme;
pub mod volume_baseline;
pub mod volume_sma;

pub use prior_extreme::{PriorExtreme, PriorExtremeSide};
pub use volume_baseline::VolumeBaseline;
pub use volume_sma::VolumeSma;

use crate::domain::Candle;

/// An indicator over a candle series.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "volume_sma_20").
    fn name(&self) -> &str;

    /// Number of leading candles without a valid value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the whole series; output length equals input length.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Candles from `(close, volume)` pairs for testing.
///
/// open = previous close (close for the first), high/low = ±1 around the body.
#[cfg(test)]
pub fn make_candles(data: &[(f64, f64)]) -> Vec<Candle> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(close, volume))| {
            let open = if i == 0 { close } else { data[i - 1].0 };
            Candle::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                volume,
            )
        })
        .collect()
}

/// Candles with constant price 10 and the given volumes.
#[cfg(test)]
pub fn make_volume_candles(volumes: &[f64]) -> Vec<Candle> {
    let pairs: Vec<(f64, f64)> = volumes.iter().map(|&v| (10.0, v)).collect();
    make_candles(&pairs)
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
