//! CSV export and import of scan results.
//!
//! - **Scan export**: `date,symbol,sector,tag`, one row per symbol, the tag
//!   written as its glyph. This is the batch-scan download format.
//! - **Signal export**: the scan columns plus `price,volume`, for the
//!   single-symbol signal list.
//!
//! Dates are `YYYY-MM-DD`. Importing accepts the tag as glyph or name.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use quantexo_core::domain::{ScanResult, SignalKind};

use crate::config::ExportConfig;

const SCAN_HEADER: [&str; 4] = ["date", "symbol", "sector", "tag"];

// ─── CSV export ─────────────────────────────────────────────────────

/// Export batch results as `date,symbol,sector,tag`.
pub fn export_scan_csv(results: &[ScanResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(SCAN_HEADER)?;
    for r in results {
        wtr.write_record([
            r.date.format("%Y-%m-%d").to_string().as_str(),
            &r.symbol,
            r.sector.as_deref().unwrap_or(""),
            r.tag.glyph(),
        ])?;
    }
    finish(wtr)
}

/// Export a signal list with the tagged candle's close and volume.
///
/// Columns: date, symbol, sector, tag, price, volume
pub fn export_signals_csv(results: &[ScanResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "symbol", "sector", "tag", "price", "volume"])?;
    for r in results {
        wtr.write_record([
            r.date.format("%Y-%m-%d").to_string(),
            r.symbol.clone(),
            r.sector.clone().unwrap_or_default(),
            r.tag.glyph().to_string(),
            r.price.map(|p| format!("{p:.2}")).unwrap_or_default(),
            r.volume.map(|v| format!("{v:.0}")).unwrap_or_default(),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

// ─── CSV import ─────────────────────────────────────────────────────

/// Parse a scan or signal export back into results.
///
/// Extra columns (price, volume) are read when present.
pub fn import_scan_csv(content: &str) -> Result<Vec<ScanResult>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers = rdr.headers().context("failed to read CSV header")?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let mut idx = [0usize; 4];
    for (slot, name) in idx.iter_mut().zip(SCAN_HEADER) {
        match column(name) {
            Some(i) => *slot = i,
            None => bail!("scan export is missing the '{name}' column"),
        }
    }
    let price_idx = column("price");
    let volume_idx = column("volume");

    let mut results = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("unreadable CSV row {}", line + 1))?;
        let cell = |i: usize| record.get(i).unwrap_or("");
        let optional = |i: Option<usize>| {
            i.map(cell)
                .filter(|s| !s.is_empty())
                .and_then(|s| s.parse::<f64>().ok())
        };

        let date = NaiveDate::parse_from_str(cell(idx[0]), "%Y-%m-%d")
            .with_context(|| format!("row {}: invalid date '{}'", line + 1, cell(idx[0])))?;
        let tag: SignalKind = cell(idx[3])
            .parse()
            .with_context(|| format!("row {}: invalid tag", line + 1))?;
        let sector = cell(idx[2]);

        results.push(ScanResult {
            symbol: cell(idx[1]).to_string(),
            date,
            tag,
            price: optional(price_idx),
            volume: optional(volume_idx),
            sector: (!sector.is_empty()).then(|| sector.to_string()),
        });
    }
    Ok(results)
}

// ─── Files ──────────────────────────────────────────────────────────

/// `Detected.Signal__<YYYY-Month-DD_HH-MMAM>_<app>_<market>.csv`, stamped
/// in the configured UTC offset.
pub fn export_filename(now: DateTime<Utc>, export: &ExportConfig) -> String {
    let offset = FixedOffset::east_opt(export.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    let stamp = now.with_timezone(&offset).format("%Y-%B-%d_%I-%M%p");
    format!("Detected.Signal__{stamp}_{}_{}.csv", export.app, export.market)
}

/// Write a scan export into `dir` and return the file path.
pub fn save_scan_export(results: &[ScanResult], dir: &Path, export: &ExportConfig) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export dir: {}", dir.display()))?;
    let path = dir.join(export_filename(Utc::now(), export));
    let csv = export_scan_csv(results)?;
    std::fs::write(&path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
