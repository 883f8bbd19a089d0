//! CSV → RawRow reader shared by the sheet and file providers.
//!
//! Two header conventions are supported:
//! - `Positional`: the first seven columns are date, symbol, open, high, low,
//!   close, volume whatever their header says (the published price sheet).
//! - `Named`: columns are located by header name, case-insensitively. The
//!   symbol column is optional (single-symbol exports).

use std::io::Read;

use super::ingest::ValidationError;
use super::provider::RawRow;

/// Canonical column order of a price row.
pub const COLUMNS: [&str; 7] = ["date", "symbol", "open", "high", "low", "close", "volume"];

/// How header columns map onto [`RawRow`] fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnLayout {
    #[default]
    Positional,
    Named,
}

/// Read every data row of a CSV document.
///
/// Cells are trimmed. Rows whose cells are all empty are skipped; short rows
/// are padded with empty cells so they fail coercion later instead of here.
pub fn read_rows<R: Read>(reader: R, layout: ColumnLayout) -> Result<Vec<RawRow>, ValidationError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| ValidationError::Csv(e.to_string()))?
        .clone();
    let indices = column_indices(&headers, layout)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| ValidationError::Csv(e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let cell = |slot: Option<usize>| -> String {
            slot.and_then(|i| record.get(i)).unwrap_or("").to_string()
        };
        rows.push(RawRow {
            date: cell(indices[0]),
            symbol: cell(indices[1]),
            open: cell(indices[2]),
            high: cell(indices[3]),
            low: cell(indices[4]),
            close: cell(indices[5]),
            volume: cell(indices[6]),
        });
    }
    Ok(rows)
}

fn column_indices(
    headers: &csv::StringRecord,
    layout: ColumnLayout,
) -> Result<[Option<usize>; 7], ValidationError> {
    match layout {
        ColumnLayout::Positional => {
            if headers.len() < COLUMNS.len() {
                return Err(ValidationError::MissingColumns {
                    missing: COLUMNS[headers.len()..]
                        .iter()
                        .map(|c| c.to_string())
                        .collect(),
                });
            }
            Ok([0, 1, 2, 3, 4, 5, 6].map(Some))
        }
        ColumnLayout::Named => {
            let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
            let indices = COLUMNS.map(find);
            let missing: Vec<String> = COLUMNS
                .iter()
                .zip(&indices)
                .filter(|(name, idx)| **name != "symbol" && idx.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(ValidationError::MissingColumns { missing });
            }
            Ok(indices)
        }
    }
}
