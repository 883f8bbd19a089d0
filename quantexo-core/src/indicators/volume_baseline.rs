//! Adaptive volume baseline.
//!
//! Window `w = min(max_window, max(min_window, n / 2))` for a series of `n`
//! candles (defaults 20 and 5). The rolling mean of volume over `w` candles
//! is back-filled over the warmup: positions before `w - 1` take the value at
//! `w - 1`. When `n < w` every position gets the mean volume of the whole
//! series.
//!
//! The back-fill makes early values depend on later candles. Adding candles
//! to the end of a series can therefore change the baseline of earlier ones.

use super::{Indicator, VolumeSma};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct VolumeBaseline {
    min_window: usize,
    max_window: usize,
}

impl Default for VolumeBaseline {
    fn default() -> Self {
        Self::new(5, 20)
    }
}

impl VolumeBaseline {
    pub fn new(min_window: usize, max_window: usize) -> Self {
        let min_window = min_window.max(1);
        Self {
            min_window,
            max_window: max_window.max(min_window),
        }
    }

    /// Window used for a series of `n` candles.
    pub fn window_for(&self, n: usize) -> usize {
        self.max_window.min(self.min_window.max(n / 2))
    }
}

impl Indicator for VolumeBaseline {
    fn name(&self) -> &str {
        "volume_baseline"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        if n == 0 {
            return Vec::new();
        }

        let w = self.window_for(n);
        if n < w {
            let mean = candles.iter().map(|c| c.volume).sum::<f64>() / n as f64;
            return vec![mean; n];
        }

        let mut result = VolumeSma::new(w).compute(candles);
        let first = result[w - 1];
        for v in result.iter_mut().take(w - 1) {
            *v = first;
        }
        result
    }
}
