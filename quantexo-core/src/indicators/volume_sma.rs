//! Simple moving average of volume.
//!
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct VolumeSma {
    period: usize,
    name: String,
}

impl VolumeSma {
    /// A period of 0 is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("volume_sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for VolumeSma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        // Summed per window: equal volumes must give an exact baseline.
        for i in (self.period - 1)..n {
            let window = &candles[i + 1 - self.period..=i];
            let sum: f64 = window.iter().map(|c| c.volume).sum();
            result[i] = sum / self.period as f64;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_volume_candles, DEFAULT_EPSILON};

    #[test]
    fn volume_sma_3_basic() {
        let candles = make_volume_candles(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let result = VolumeSma::new(3).compute(&candles);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 20.0, DEFAULT_EPSILON);
        assert_approx(result[3], 30.0, DEFAULT_EPSILON);
        assert_approx(result[4], 40.0, DEFAULT_EPSILON);
    }

    #[test]
    fn too_few_candles_all_nan() {
        let candles = make_volume_candles(&[10.0, 20.0]);
        assert!(VolumeSma::new(5).compute(&candles).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn zero_period_is_one() {
        let sma = VolumeSma::new(0);
        assert_eq!(sma.period(), 1);
        assert_eq!(sma.lookback(), 0);
        assert_eq!(sma.name(), "volume_sma_1");
    }
}
