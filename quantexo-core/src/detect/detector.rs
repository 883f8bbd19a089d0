//! Single-pass signal detector.
//!
//! Each candle from `first_index` on is classified against eight rules in
//! priority order; the first rule whose condition holds decides the outcome
//! for that candle:
//!
//! 1. aggressive buying    5. bullish breakout
//! 2. aggressive selling   6. bearish breakdown
//! 3. buyer absorption     7. bullish point of interest
//! 4. seller absorption    8. bearish point of interest
//!
//! Cooldown is part of the condition for rules 1-2 (a suppressed candle is
//! still checked against later rules) but not for rules 5-6 (a suppressed
//! breakout ends evaluation with no tag). Absorption rules tag a later
//! candle, never the trigger, and keep at most one live marker per side.
//!
//! Signals are emitted in index order: after candle `i` is evaluated, its
//! tag (if any) is appended. An absorption marker is therefore emitted when
//! the scan reaches the marked candle, and stays in the signal list even if a
//! later trigger clears it from the series.

use tracing::debug;

use super::cooldown::TagLedger;
use super::params::DetectorParams;
use crate::domain::{Candle, CandleSeries, ScanResult, SignalKind};
use crate::indicators::{Indicator, PriorExtreme, VolumeBaseline};

/// Tagged copy of the input plus the emitted signals.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub series: CandleSeries,
    pub signals: Vec<ScanResult>,
}

impl Detection {
    /// The signal with the greatest date. Ties go to the last emitted.
    pub fn latest(&self) -> Option<&ScanResult> {
        self.signals.iter().max_by_key(|s| s.date)
    }

    /// Signals of one kind, in emission order.
    pub fn of_kind(&self, kind: SignalKind) -> impl Iterator<Item = &ScanResult> + '_ {
        self.signals.iter().filter(move |s| s.tag == kind)
    }

    /// Signal counts indexed by [`SignalKind::index`].
    pub fn counts(&self) -> [usize; 8] {
        let mut counts = [0; 8];
        for s in &self.signals {
            counts[s.tag.index()] += 1;
        }
        counts
    }
}

/// What rule evaluation decided for one candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Tag(SignalKind),
    /// Trigger for an absorption rule; the marker goes on a later candle.
    Absorb(SignalKind),
    /// A breakout rule matched while in cooldown.
    Suppressed,
    NoMatch,
}

struct Pass<'a> {
    candles: &'a [Candle],
    avg_volume: &'a [f64],
    prior_high: Vec<f64>,
    prior_low: Vec<f64>,
    tags: Vec<Option<SignalKind>>,
    ledger: TagLedger,
}

impl Pass<'_> {
    fn avg(&self, i: usize) -> f64 {
        self.avg_volume.get(i).copied().unwrap_or(f64::NAN)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalDetector {
    params: DetectorParams,
}

impl SignalDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Volume baseline the detector compares against.
    pub fn baseline(&self, series: &CandleSeries) -> Vec<f64> {
        VolumeBaseline::new(self.params.baseline_min_window, self.params.baseline_max_window)
            .compute(series.candles())
    }

    /// Run detection with the configured baseline. The input is not modified.
    pub fn detect(&self, series: &CandleSeries) -> Detection {
        let baseline = self.baseline(series);
        self.detect_with_baseline(series, &baseline)
    }

    /// Run detection against a caller-supplied baseline.
    ///
    /// Positions missing from `avg_volume` compare as NaN, so volume rules
    /// never match there.
    pub fn detect_with_baseline(&self, series: &CandleSeries, avg_volume: &[f64]) -> Detection {
        let candles = series.candles();
        let n = candles.len();
        let untagged = series.with_tags(&vec![None; n]);

        if n < self.params.min_candles.max(1) {
            return Detection {
                series: untagged,
                signals: Vec::new(),
            };
        }

        let lookback = self.params.breakout_lookback;
        let mut pass = Pass {
            candles,
            avg_volume,
            prior_high: PriorExtreme::high(lookback).compute(candles),
            prior_low: PriorExtreme::low(lookback).compute(candles),
            tags: vec![None; n],
            ledger: TagLedger::new(),
        };
        let mut signals = Vec::new();

        let start = self.params.first_index.max(1).min(n - 1);
        for i in start..n {
            match self.evaluate(&pass, i) {
                Outcome::Tag(kind) => {
                    pass.tags[i] = Some(kind);
                    pass.ledger.record(kind, i);
                }
                Outcome::Absorb(kind) => self.absorb(&mut pass, i, kind),
                Outcome::Suppressed | Outcome::NoMatch => {}
            }

            if let Some(kind) = pass.tags[i] {
                signals.push(ScanResult::from_candle(series.symbol(), &candles[i], kind));
            }
        }

        debug!(
            symbol = series.symbol(),
            candles = n,
            signals = signals.len(),
            "detection complete"
        );

        Detection {
            series: untagged.with_tags(&pass.tags),
            signals,
        }
    }

    fn evaluate(&self, pass: &Pass<'_>, i: usize) -> Outcome {
        let p = &self.params;
        let row = &pass.candles[i];
        let prev = &pass.candles[i - 1];
        let avg = pass.avg(i);
        let body = row.body();
        let range = row.range();

        let aggressive_volume = row.volume > avg * p.aggressive_volume_mult;
        let grows = body > prev.body();

        if row.is_bullish()
            && row.close >= row.high - range * p.close_position_frac
            && aggressive_volume
            && grows
            && !pass
                .ledger
                .in_cooldown(SignalKind::AggressiveBuying, i, p.aggressive_cooldown)
        {
            return Outcome::Tag(SignalKind::AggressiveBuying);
        }
        if row.is_bearish()
            && row.close <= row.low + range * p.close_position_frac
            && aggressive_volume
            && grows
            && !pass
                .ledger
                .in_cooldown(SignalKind::AggressiveSelling, i, p.aggressive_cooldown)
        {
            return Outcome::Tag(SignalKind::AggressiveSelling);
        }

        let absorption_volume = row.volume > avg * p.absorption_volume_mult;
        if row.is_bullish() && absorption_volume {
            return Outcome::Absorb(SignalKind::BuyerAbsorption);
        }
        if row.is_bearish() && absorption_volume {
            return Outcome::Absorb(SignalKind::SellerAbsorption);
        }

        let breakout_volume = row.volume > avg * p.breakout_volume_mult;
        let has_history = i >= p.breakout_lookback;
        if has_history && row.high > pass.prior_high[i] && breakout_volume {
            return self.unless_cooling(pass, i, SignalKind::BullishBreakout);
        }
        if has_history && row.low < pass.prior_low[i] && breakout_volume {
            return self.unless_cooling(pass, i, SignalKind::BearishBreakdown);
        }

        let poi = body > range * p.poi_body_frac && row.volume > avg * p.poi_volume_mult;
        if row.is_bullish() && poi {
            return Outcome::Tag(SignalKind::BullishPoi);
        }
        if row.is_bearish() && poi {
            return Outcome::Tag(SignalKind::BearishPoi);
        }

        Outcome::NoMatch
    }

    fn unless_cooling(&self, pass: &Pass<'_>, i: usize, kind: SignalKind) -> Outcome {
        if pass.ledger.in_cooldown(kind, i, self.params.breakout_cooldown) {
            Outcome::Suppressed
        } else {
            Outcome::Tag(kind)
        }
    }

    /// Clear the live marker of `kind`, then mark the first of the next
    /// `absorption_lookahead` candles whose close crosses the trigger's open.
    fn absorb(&self, pass: &mut Pass<'_>, i: usize, kind: SignalKind) {
        if let Some(marker) = pass.ledger.last(kind) {
            if pass.tags[marker] == Some(kind) {
                pass.tags[marker] = None;
            }
        }

        let trigger_open = pass.candles[i].open;
        let end = (i + self.params.absorption_lookahead).min(pass.candles.len() - 1);
        let confirmed = (i + 1..=end).find(|&j| {
            let close = pass.candles[j].close;
            match kind {
                SignalKind::BuyerAbsorption => close < trigger_open,
                _ => close > trigger_open,
            }
        });

        if let Some(j) = confirmed {
            pass.tags[j] = Some(kind);
            pass.ledger.record(kind, j);
        }
    }
}

/// Detect with default parameters.
pub fn detect(series: &CandleSeries) -> Detection {
    SignalDetector::default().detect(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    /// (open, high, low, close, volume) rows on consecutive days.
    fn series(rows: &[(f64, f64, f64, f64, f64)]) -> CandleSeries {
        let candles = rows
            .iter()
            .enumerate()
            .map(|(i, &(o, h, l, c, v))| Candle::new(day(i), o, h, l, c, v))
            .collect();
        CandleSeries::new("TEST", candles).unwrap()
    }

    fn flat(count: usize) -> Vec<(f64, f64, f64, f64, f64)> {
        vec![(10.0, 10.0, 10.0, 10.0, 100.0); count]
    }

    #[test]
    fn short_series_has_no_signals() {
        let s = series(&[
            (10.0, 10.0, 10.0, 10.0, 100.0),
            (10.0, 10.0, 10.0, 10.0, 100.0),
            (10.0, 15.0, 10.0, 15.0, 5000.0),
        ]);
        let d = detect(&s);
        assert!(d.signals.is_empty());
        assert_eq!(d.series.len(), 3);
    }

    #[test]
    fn aggressive_buying_on_fifth_candle() {
        let mut rows = flat(4);
        rows.push((10.0, 15.0, 10.0, 15.0, 500.0));
        let d = detect(&series(&rows));
        assert_eq!(d.signals.len(), 1);
        assert_eq!(d.signals[0].tag, SignalKind::AggressiveBuying);
        assert_eq!(d.signals[0].date, day(4));
        assert_eq!(d.signals[0].price, Some(15.0));
        assert_eq!(d.series.candles()[4].tag, Some(SignalKind::AggressiveBuying));
    }

    #[test]
    fn breakout_at_index_ten() {
        let mut rows = flat(10);
        rows.push((10.0, 12.0, 10.0, 10.0, 300.0));
        let d = detect(&series(&rows));
        assert_eq!(d.signals.len(), 1);
        assert_eq!(d.signals[0].tag, SignalKind::BullishBreakout);
        assert_eq!(d.signals[0].date, day(10));
    }

    #[test]
    fn suppressed_breakout_does_not_fall_through() {
        let mut rows = flat(10);
        rows.push((10.0, 12.0, 10.0, 10.0, 300.0));
        // New high and new low: the breakout rule matches first and is in cooldown.
        rows.push((10.0, 13.0, 8.0, 10.0, 600.0));
        let d = detect(&series(&rows));
        assert_eq!(d.signals.len(), 1);
        assert_eq!(d.series.candles()[11].tag, None);
    }

    #[test]
    fn buyer_absorption_marks_confirming_candle() {
        let s = series(&[
            (10.0, 10.0, 10.0, 10.0, 100.0),
            (10.0, 10.0, 10.0, 10.0, 100.0),
            (10.0, 10.0, 10.0, 10.0, 100.0),
            (10.0, 11.5, 10.0, 11.0, 200.0),
            (11.0, 11.0, 10.4, 10.5, 100.0),
            (10.5, 10.6, 9.4, 9.5, 100.0),
        ]);
        let d = detect(&s);
        assert_eq!(d.series.candles()[3].tag, None);
        assert_eq!(d.series.candles()[4].tag, None);
        assert_eq!(d.series.candles()[5].tag, Some(SignalKind::BuyerAbsorption));
        assert_eq!(d.signals.len(), 1);
        assert_eq!(d.signals[0].date, day(5));
    }

    #[test]
    fn new_absorption_trigger_clears_old_marker() {
        let s = series(&[
            (10.0, 10.0, 10.0, 10.0, 100.0),
            (10.0, 10.0, 10.0, 10.0, 100.0),
            (10.0, 10.0, 10.0, 10.0, 100.0),
            (10.0, 11.5, 10.0, 11.0, 200.0),
            (11.0, 11.0, 9.7, 9.8, 100.0),
            (9.8, 11.5, 9.8, 11.0, 200.0),
            (11.0, 11.0, 9.4, 9.5, 100.0),
            (9.5, 9.5, 9.5, 9.5, 100.0),
        ]);
        let d = detect(&s);
        let tags = d.series.tags();
        assert_eq!(tags[4], None);
        assert_eq!(tags[6], Some(SignalKind::BuyerAbsorption));
        assert_eq!(
            tags.iter()
                .filter(|t| **t == Some(SignalKind::BuyerAbsorption))
                .count(),
            1
        );
        // Both markers were emitted when the scan reached them.
        let dates: Vec<NaiveDate> = d.of_kind(SignalKind::BuyerAbsorption).map(|s| s.date).collect();
        assert_eq!(dates, vec![day(4), day(6)]);
    }

    #[test]
    fn absorption_trigger_on_last_candle_is_harmless() {
        let mut rows = flat(4);
        rows.push((10.0, 11.5, 10.0, 11.0, 200.0));
        let d = detect(&series(&rows));
        assert!(d.signals.is_empty());
    }

    #[test]
    fn aggressive_buying_cooldown() {
        let mut rows = flat(4);
        rows.push((10.0, 15.0, 10.0, 15.0, 1000.0));
        rows.push((15.0, 15.0, 15.0, 15.0, 100.0));
        rows.push((15.0, 25.0, 15.0, 25.0, 3000.0));
        let d = detect(&series(&rows));
        assert_eq!(d.of_kind(SignalKind::AggressiveBuying).count(), 1);
        assert_eq!(d.series.candles()[6].tag, None);
    }

    #[test]
    fn poi_reachable_when_absorption_needs_more_volume() {
        let mut rows = flat(5);
        rows.push((10.0, 14.0, 10.0, 13.5, 400.0));
        let params = DetectorParams {
            absorption_volume_mult: 3.0,
            ..DetectorParams::default()
        };
        let d = SignalDetector::new(params).detect(&series(&rows));
        assert_eq!(d.signals.len(), 1);
        assert_eq!(d.signals[0].tag, SignalKind::BullishPoi);
    }

    #[test]
    fn input_is_not_modified() {
        let mut rows = flat(4);
        rows.push((10.0, 15.0, 10.0, 15.0, 500.0));
        let s = series(&rows);
        let before = s.clone();
        let _ = detect(&s);
        assert_eq!(s, before);
    }

    #[test]
    fn short_baseline_never_matches_volume_rules() {
        let mut rows = flat(4);
        rows.push((10.0, 15.0, 10.0, 15.0, 500.0));
        let d = SignalDetector::default().detect_with_baseline(&series(&rows), &[]);
        assert!(d.signals.is_empty());
    }

    #[test]
    fn latest_and_counts() {
        let mut rows = flat(10);
        rows.push((10.0, 12.0, 10.0, 10.0, 300.0));
        let d = detect(&series(&rows));
        assert_eq!(d.latest().map(|s| s.date), Some(day(10)));
        assert_eq!(d.counts()[SignalKind::BullishBreakout.index()], 1);
    }

    #[test]
    fn latest_is_greatest_date_not_last_pushed() {
        let s = series(&flat(6));
        let signal = |i: usize, tag| ScanResult::from_candle("TEST", &s.candles()[i], tag);
        let d = Detection {
            signals: vec![
                signal(5, SignalKind::BuyerAbsorption),
                signal(2, SignalKind::AggressiveBuying),
            ],
            series: s.clone(),
        };
        let latest = d.latest().unwrap();
        assert_eq!(latest.date, day(5));
        assert_eq!(latest.tag, SignalKind::BuyerAbsorption);

        let tied = Detection {
            signals: vec![
                signal(4, SignalKind::AggressiveBuying),
                signal(4, SignalKind::BearishPoi),
            ],
            series: s.clone(),
        };
        assert_eq!(tied.latest().unwrap().tag, SignalKind::BearishPoi);
    }
}
