//! Highest high / lowest low of the candles *before* the current one.
//!
//! Value at t covers `[t-period, t)`, so the current candle is excluded and a
//! breakout compares today's extreme against the prior range.
//! Lookback: period (first valid value at index `period`).

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorExtremeSide {
    High,
    Low,
}

#[derive(Debug, Clone)]
pub struct PriorExtreme {
    period: usize,
    side: PriorExtremeSide,
    name: String,
}

impl PriorExtreme {
    pub fn high(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            side: PriorExtremeSide::High,
            name: format!("prior_high_{period}"),
        }
    }

    pub fn low(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            side: PriorExtremeSide::Low,
            name: format!("prior_low_{period}"),
        }
    }
}

impl Indicator for PriorExtreme {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let window = &candles[i - self.period..i];
            result[i] = match self.side {
                PriorExtremeSide::High => window
                    .iter()
                    .map(|c| c.high)
                    .fold(f64::NEG_INFINITY, f64::max),
                PriorExtremeSide::Low => window
                    .iter()
                    .map(|c| c.low)
                    .fold(f64::INFINITY, f64::min),
            };
        }
        result
    }
}
