//! Ingest pipeline: raw rows → validated, sorted, de-duplicated CandleSeries.
//!
//! Two strictness levels:
//! - `Strict` fails the whole request on the first offending column and
//!   reports how many rows are bad plus a few examples (interactive path).
//! - `Lenient` drops offending rows and counts them (batch path).

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use super::provider::RawRow;
use crate::domain::{Candle, CandleSeries, SeriesError};

/// Maximum number of offending rows carried in a validation error.
pub const MAX_EXAMPLES: usize = 5;

/// Date formats accepted for the date column (a trailing time part is ignored).
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// How to treat rows that fail date parsing or numeric coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Any bad row fails the request with a diagnostic.
    #[default]
    Strict,
    /// Bad rows are dropped and counted.
    Lenient,
}

/// One offending row, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadRow {
    /// 0-based position in the input rows.
    pub row: usize,
    pub date: String,
    pub value: String,
}

impl fmt::Display for BadRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}): '{}'", self.row, self.date, self.value)
    }
}

fn format_examples(examples: &[BadRow]) -> String {
    examples
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Input that cannot be turned into a candle series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("invalid date format in {count} rows; examples: {}", format_examples(.examples))]
    InvalidDates { count: usize, examples: Vec<BadRow> },

    #[error("found {count} invalid values in {column} column; examples: {}", format_examples(.examples))]
    InvalidNumbers {
        column: String,
        count: usize,
        examples: Vec<BadRow>,
    },

    #[error("no valid data for '{symbol}' after cleaning")]
    Empty { symbol: String },

    #[error("unreadable CSV: {0}")]
    Csv(String),

    #[error("series invariant violated: {0}")]
    Series(#[from] SeriesError),
}

impl ValidationError {
    /// True for the "nothing left" case, which batch scans skip silently.
    pub fn is_empty_data(&self) -> bool {
        matches!(self, ValidationError::Empty { .. })
    }
}

/// Counters describing what cleaning did to the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub rows_in: usize,
    pub rows_kept: usize,
    pub bad_dates: usize,
    pub bad_numbers: usize,
    pub duplicates: usize,
    /// Candles whose high/low do not bracket open/close (kept, only counted).
    pub inverted: usize,
}

/// Output of a successful ingest.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub series: CandleSeries,
    pub report: IngestReport,
}

/// Parse a date cell, ignoring any time-of-day suffix.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Coerce a numeric cell: strip every character that is not a digit or `.`,
/// then parse. Empty, multi-dot and non-finite results are rejected.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

struct ParsedRow {
    date: NaiveDate,
    values: [f64; 5],
}

const NUMERIC_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

fn numeric_cells(row: &RawRow) -> [&str; 5] {
    [&row.open, &row.high, &row.low, &row.close, &row.volume]
}

/// Clean `rows` into a candle series for `symbol`.
///
/// Rows are parsed, sorted ascending by date (stable), and de-duplicated
/// keeping the first row for each date.
pub fn ingest(
    symbol: &str,
    rows: &[RawRow],
    strictness: Strictness,
) -> Result<Ingested, ValidationError> {
    let mut report = IngestReport {
        rows_in: rows.len(),
        ..IngestReport::default()
    };

    let parsed = match strictness {
        Strictness::Strict => parse_strict(rows)?,
        Strictness::Lenient => parse_lenient(rows, &mut report),
    };

    if report.bad_dates + report.bad_numbers > 0 {
        debug!(
            symbol,
            bad_dates = report.bad_dates,
            bad_numbers = report.bad_numbers,
            "dropped unparseable rows"
        );
    }

    let mut parsed = parsed;
    parsed.sort_by_key(|p| p.date);

    let mut candles: Vec<Candle> = Vec::with_capacity(parsed.len());
    for p in parsed {
        if candles.last().is_some_and(|c| c.date == p.date) {
            report.duplicates += 1;
            continue;
        }
        let [open, high, low, close, volume] = p.values;
        candles.push(Candle::new(p.date, open, high, low, close, volume));
    }

    if candles.is_empty() {
        return Err(ValidationError::Empty {
            symbol: symbol.to_string(),
        });
    }
    if report.duplicates > 0 {
        warn!(symbol, duplicates = report.duplicates, "duplicate dates dropped (first kept)");
    }

    let series = CandleSeries::new(symbol, candles)?;
    report.rows_kept = series.len();
    report.inverted = series.inverted_count();
    if report.inverted > 0 {
        debug!(symbol, inverted = report.inverted, "candles with high/low not bracketing open/close");
    }

    Ok(Ingested { series, report })
}

fn parse_strict(rows: &[RawRow]) -> Result<Vec<ParsedRow>, ValidationError> {
    let dates: Vec<Option<NaiveDate>> = rows.iter().map(|r| parse_date(&r.date)).collect();
    let bad: Vec<BadRow> = rows
        .iter()
        .zip(&dates)
        .enumerate()
        .filter(|(_, (_, d))| d.is_none())
        .map(|(i, (r, _))| BadRow {
            row: i,
            date: r.date.clone(),
            value: r.date.clone(),
        })
        .collect();
    if !bad.is_empty() {
        return Err(ValidationError::InvalidDates {
            count: bad.len(),
            examples: bad.into_iter().take(MAX_EXAMPLES).collect(),
        });
    }

    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(NUMERIC_COLUMNS.len());
    for (col_idx, column) in NUMERIC_COLUMNS.iter().enumerate() {
        let mut values = Vec::with_capacity(rows.len());
        let mut bad = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let cell = numeric_cells(row)[col_idx];
            match coerce_number(cell) {
                Some(v) => values.push(v),
                None => bad.push(BadRow {
                    row: i,
                    date: row.date.clone(),
                    value: cell.to_string(),
                }),
            }
        }
        if !bad.is_empty() {
            return Err(ValidationError::InvalidNumbers {
                column: (*column).to_string(),
                count: bad.len(),
                examples: bad.into_iter().take(MAX_EXAMPLES).collect(),
            });
        }
        columns.push(values);
    }

    Ok(dates
        .into_iter()
        .enumerate()
        .filter_map(|(i, d)| {
            d.map(|date| ParsedRow {
                date,
                values: [
                    columns[0][i],
                    columns[1][i],
                    columns[2][i],
                    columns[3][i],
                    columns[4][i],
                ],
            })
        })
        .collect())
}

fn parse_lenient(rows: &[RawRow], report: &mut IngestReport) -> Vec<ParsedRow> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(date) = parse_date(&row.date) else {
            report.bad_dates += 1;
            continue;
        };
        let cells = numeric_cells(row);
        let mut values = [0.0; 5];
        let mut ok = true;
        for (slot, cell) in values.iter_mut().zip(cells) {
            match coerce_number(cell) {
                Some(v) => *slot = v,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            out.push(ParsedRow { date, values });
        } else {
            report.bad_numbers += 1;
        }
    }
    out
}
