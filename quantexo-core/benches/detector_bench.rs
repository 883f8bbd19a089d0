//! Criterion benchmarks for the detection hot path.
//!
//! 1. Volume baseline over long histories
//! 2. Full detection pass (one year and ten years of candles)
//! 3. Batch-style detection over a 10-candle tail

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quantexo_core::detect::SignalDetector;
use quantexo_core::domain::{Candle, CandleSeries};
use quantexo_core::indicators::{Indicator, VolumeBaseline};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> CandleSeries {
    let base = chrono::NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let candles = (0..n)
        .map(|i| {
            let x = i as f64;
            let close = 500.0 + (x * 0.1).sin() * 40.0;
            let open = close - (x * 0.7).cos() * 6.0;
            let high = open.max(close) + 2.0 + (x * 0.3).sin().abs() * 3.0;
            let low = open.min(close) - 2.0;
            let spike = if i % 17 == 0 { 6.0 } else { 1.0 };
            let volume = (10_000.0 + (x * 0.9).sin() * 3_000.0) * spike;
            Candle::new(base + chrono::Duration::days(i as i64), open, high, low, close, volume)
        })
        .collect();
    CandleSeries::new("BENCH", candles).unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_baseline(c: &mut Criterion) {
    let mut group = c.benchmark_group("volume_baseline");
    for n in [250, 2_500] {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, s| {
            b.iter(|| VolumeBaseline::default().compute(black_box(s.candles())))
        });
    }
    group.finish();
}

fn bench_detect(c: &mut Criterion) {
    let detector = SignalDetector::default();
    let mut group = c.benchmark_group("detect");
    for n in [250, 2_500] {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, s| {
            b.iter(|| detector.detect(black_box(s)))
        });
    }
    group.finish();
}

fn bench_batch_tail(c: &mut Criterion) {
    let detector = SignalDetector::default();
    let series = make_series(250);
    c.bench_function("detect_tail_10", |b| {
        b.iter(|| detector.detect(black_box(&series.tail(10))))
    });
}

criterion_group!(benches, bench_baseline, bench_detect, bench_batch_tail);
criterion_main!(benches);
