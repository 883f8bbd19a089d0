//! Portfolio value history: daily and cumulative returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Change from the previous point, in percent. None for the first point
    /// or when the previous value is 0.
    pub daily_return_pct: Option<f64>,
    /// Change from the first point, in percent (0 when the first value is 0).
    pub cumulative_return_pct: f64,
}

/// Returns per date, oldest first. Input order does not matter.
pub fn performance(history: &[HistoryPoint]) -> Vec<PerformancePoint> {
    let mut points = history.to_vec();
    points.sort_by_key(|p| p.date);

    let base = points.first().map(|p| p.value).unwrap_or(0.0);
    let mut prev: Option<f64> = None;
    points
        .into_iter()
        .map(|p| {
            let daily_return_pct = prev
                .filter(|v| *v != 0.0)
                .map(|v| (p.value / v - 1.0) * 100.0);
            let cumulative_return_pct = if base != 0.0 {
                (p.value / base - 1.0) * 100.0
            } else {
                0.0
            };
            prev = Some(p.value);
            PerformancePoint {
                date: p.date,
                value: p.value,
                daily_return_pct,
                cumulative_return_pct,
            }
        })
        .collect()
}
