//! Candle and CandleSeries: the validated daily OHLCV input of the detector.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::signal::SignalKind;

/// One day's OHLCV record for a symbol.
///
/// `point_change` is `close - previous close` and is 0 for the first candle of
/// a series. `tag` is the only field the detector writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub tag: Option<SignalKind>,
    pub point_change: f64,
}

impl Candle {
    /// Untagged candle with `point_change` left at 0 (filled in by [`CandleSeries::new`]).
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            tag: None,
            point_change: 0.0,
        }
    }

    /// Absolute body size `|close - open|`.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full range `high - low`.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.open > self.close
    }

    /// True when high/low do not bracket open and close (a data error upstream).
    pub fn is_inverted(&self) -> bool {
        self.high < self.open.max(self.close) || self.low > self.open.min(self.close)
    }
}

/// Structural problems that prevent building a [`CandleSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("candle {index}: date {date} is not after the previous candle")]
    NotIncreasing { index: usize, date: NaiveDate },

    #[error("candle {index}: {field} is not a finite non-negative number ({value})")]
    InvalidValue {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

/// Time-ordered candles for one symbol.
///
/// Invariants (checked by [`CandleSeries::new`]):
/// - dates strictly increasing, no duplicates
/// - open/high/low/close/volume finite and non-negative
///
/// `high >= max(open, close)` is *not* enforced; see [`Candle::is_inverted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validate and build a series. Recomputes `point_change` for every candle.
    pub fn new(symbol: impl Into<String>, mut candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (index, candle) in candles.iter().enumerate() {
            for (field, value) in [
                ("open", candle.open),
                ("high", candle.high),
                ("low", candle.low),
                ("close", candle.close),
                ("volume", candle.volume),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(SeriesError::InvalidValue {
                        index,
                        field,
                        value,
                    });
                }
            }
            if index > 0 && candle.date <= candles[index - 1].date {
                return Err(SeriesError::NotIncreasing {
                    index,
                    date: candle.date,
                });
            }
        }

        fill_point_change(&mut candles);
        Ok(Self {
            symbol: symbol.into(),
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.candles.first().map(|c| c.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.candles.last().map(|c| c.date)
    }

    /// Per-candle tags, aligned to [`CandleSeries::candles`].
    pub fn tags(&self) -> Vec<Option<SignalKind>> {
        self.candles.iter().map(|c| c.tag).collect()
    }

    /// Indices and kinds of every tagged candle.
    pub fn tagged(&self) -> impl Iterator<Item = (usize, SignalKind)> + '_ {
        self.candles
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.tag.map(|t| (i, t)))
    }

    /// The most recent `n` candles as a fresh, untagged series.
    ///
    /// `point_change` restarts at 0 for the new first candle.
    pub fn tail(&self, n: usize) -> CandleSeries {
        let start = self.candles.len().saturating_sub(n);
        let mut candles: Vec<Candle> = self.candles[start..]
            .iter()
            .cloned()
            .map(|mut c| {
                c.tag = None;
                c
            })
            .collect();
        fill_point_change(&mut candles);
        CandleSeries {
            symbol: self.symbol.clone(),
            candles,
        }
    }

    /// Copy of this series with the given tags applied.
    ///
    /// `tags` must have one entry per candle; extra entries are ignored.
    pub fn with_tags(&self, tags: &[Option<SignalKind>]) -> CandleSeries {
        let mut out = self.clone();
        for (candle, tag) in out.candles.iter_mut().zip(tags) {
            candle.tag = *tag;
        }
        out
    }

    /// Number of candles whose high/low do not bracket open/close.
    pub fn inverted_count(&self) -> usize {
        self.candles.iter().filter(|c| c.is_inverted()).count()
    }

    /// Deterministic BLAKE3 fingerprint over symbol, dates and OHLCV values.
    ///
    /// Tags are excluded, so a tagged and an untagged copy share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for c in &self.candles {
            hasher.update(c.date.to_string().as_bytes());
            hasher.update(&c.open.to_le_bytes());
            hasher.update(&c.high.to_le_bytes());
            hasher.update(&c.low.to_le_bytes());
            hasher.update(&c.close.to_le_bytes());
            hasher.update(&c.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

fn fill_point_change(candles: &mut [Candle]) {
    let mut prev_close: Option<f64> = None;
    for candle in candles.iter_mut() {
        candle.point_change = prev_close.map_or(0.0, |p| candle.close - p);
        prev_close = Some(candle.close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample() -> Vec<Candle> {
        vec![
            Candle::new(day(1), 10.0, 11.0, 9.5, 10.5, 100.0),
            Candle::new(day(2), 10.5, 12.0, 10.0, 11.5, 150.0),
            Candle::new(day(3), 11.5, 11.8, 10.2, 10.4, 90.0),
        ]
    }

    #[test]
    fn computes_point_change() {
        let series = CandleSeries::new("NABIL", sample()).unwrap();
        let changes: Vec<f64> = series.candles().iter().map(|c| c.point_change).collect();
        assert_eq!(changes[0], 0.0);
        assert!((changes[1] - 1.0).abs() < 1e-12);
        assert!((changes[2] + 1.1).abs() < 1e-12);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let mut candles = sample();
        candles[2].date = day(2);
        let err = CandleSeries::new("NABIL", candles).unwrap_err();
        assert_eq!(err, SeriesError::NotIncreasing { index: 2, date: day(2) });
    }

    #[test]
    fn rejects_nan_and_negative() {
        let mut candles = sample();
        candles[1].volume = f64::NAN;
        assert!(matches!(
            CandleSeries::new("X", candles).unwrap_err(),
            SeriesError::InvalidValue { index: 1, field: "volume", .. }
        ));

        let mut candles = sample();
        candles[0].low = -1.0;
        assert!(matches!(
            CandleSeries::new("X", candles).unwrap_err(),
            SeriesError::InvalidValue { index: 0, field: "low", .. }
        ));
    }

    #[test]
    fn tail_resets_point_change_and_tags() {
        let series = CandleSeries::new("NABIL", sample()).unwrap();
        let tagged = series.with_tags(&[None, Some(SignalKind::BullishPoi), None]);
        let tail = tagged.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.first_date(), Some(day(2)));
        assert_eq!(tail.candles()[0].point_change, 0.0);
        assert!(tail.tags().iter().all(|t| t.is_none()));
    }

    #[test]
    fn tail_longer_than_series_is_whole_series() {
        let series = CandleSeries::new("NABIL", sample()).unwrap();
        assert_eq!(series.tail(10).len(), 3);
    }

    #[test]
    fn body_range_and_direction() {
        let c = Candle::new(day(1), 10.0, 12.0, 9.0, 11.0, 1.0);
        assert_eq!(c.body(), 1.0);
        assert_eq!(c.range(), 3.0);
        assert!(c.is_bullish());
        assert!(!c.is_bearish());
        assert!(!c.is_inverted());
    }

    #[test]
    fn detects_inverted_candle() {
        let c = Candle::new(day(1), 10.0, 10.5, 9.0, 11.0, 1.0);
        assert!(c.is_inverted());
    }

    #[test]
    fn fingerprint_ignores_tags() {
        let series = CandleSeries::new("NABIL", sample()).unwrap();
        let tagged = series.with_tags(&[Some(SignalKind::AggressiveBuying), None, None]);
        assert_eq!(series.fingerprint(), tagged.fingerprint());

        let other = CandleSeries::new("NICA", sample()).unwrap();
        assert_ne!(series.fingerprint(), other.fingerprint());
    }
}
