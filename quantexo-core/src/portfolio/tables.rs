//! CSV readers for the portfolio tables.
//!
//! Headers match case-insensitively after trimming. Blank rows are skipped.

use std::io::Read;

use super::history::HistoryPoint;
use super::holdings::Holding;
use super::ledger::{Dividend, TradeSide, Transaction};
use super::{parse_amount, PortfolioError};
use crate::data::parse_date;

struct Table {
    name: &'static str,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn read<R: Read>(name: &'static str, reader: R) -> Result<Self, PortfolioError> {
        let csv_err = |e: csv::Error| PortfolioError::Csv {
            table: name,
            message: e.to_string(),
        };
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            if !record.iter().all(str::is_empty) {
                rows.push(record);
            }
        }
        Ok(Self {
            name,
            headers,
            rows,
        })
    }

    fn find(&self, column: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
    }

    /// Indices of `columns`, or the list of those missing.
    fn require<const N: usize>(&self, columns: [&str; N]) -> Result<[usize; N], PortfolioError> {
        let found = columns.map(|c| self.find(c));
        let missing: Vec<String> = columns
            .iter()
            .zip(&found)
            .filter(|(_, idx)| idx.is_none())
            .map(|(c, _)| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PortfolioError::MissingColumns {
                table: self.name,
                missing,
            });
        }
        Ok(found.map(|idx| idx.unwrap_or_default()))
    }
}

fn cell(record: &csv::StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

/// Holdings: `Symbol, Quantity, Avg Buy Price, Last Traded Price, Prev Close Price`.
/// Non-numeric cells count as 0.
pub fn read_holdings<R: Read>(reader: R) -> Result<Vec<Holding>, PortfolioError> {
    let table = Table::read("holdings", reader)?;
    let [sym, qty, avg, ltp, prev] = table.require([
        "Symbol",
        "Quantity",
        "Avg Buy Price",
        "Last Traded Price",
        "Prev Close Price",
    ])?;
    let num = |r: &csv::StringRecord, i: usize| parse_amount(cell(r, Some(i))).unwrap_or(0.0);
    Ok(table
        .rows
        .iter()
        .map(|r| {
            Holding::new(
                cell(r, Some(sym)),
                num(r, qty),
                num(r, avg),
                num(r, ltp),
                num(r, prev),
            )
        })
        .collect())
}

/// Transactions: `Symbol, Type, Quantity, Price`, optional `Date`.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>, PortfolioError> {
    let table = Table::read("transactions", reader)?;
    let [sym, kind, qty, price] = table.require(["Symbol", "Type", "Quantity", "Price"])?;
    let date = table.find("Date");
    Ok(table
        .rows
        .iter()
        .map(|r| {
            Transaction::new(
                parse_date(cell(r, date)),
                cell(r, Some(sym)),
                TradeSide::parse(cell(r, Some(kind))),
                parse_amount(cell(r, Some(qty))),
                parse_amount(cell(r, Some(price))),
            )
        })
        .collect())
}

/// Dividends: `Symbol, Amount`, optional `Date`. Non-numeric amounts count as 0.
pub fn read_dividends<R: Read>(reader: R) -> Result<Vec<Dividend>, PortfolioError> {
    let table = Table::read("dividends", reader)?;
    let [sym, amount] = table.require(["Symbol", "Amount"])?;
    let date = table.find("Date");
    Ok(table
        .rows
        .iter()
        .map(|r| {
            Dividend::new(
                parse_date(cell(r, date)),
                cell(r, Some(sym)),
                parse_amount(cell(r, Some(amount))).unwrap_or(0.0),
            )
        })
        .collect())
}

/// History: `Date, Portfolio Value`. Rows with a bad date or value are dropped.
pub fn read_history<R: Read>(reader: R) -> Result<Vec<HistoryPoint>, PortfolioError> {
    let table = Table::read("history", reader)?;
    let [date, value] = table.require(["Date", "Portfolio Value"])?;
    Ok(table
        .rows
        .iter()
        .filter_map(|r| {
            Some(HistoryPoint {
                date: parse_date(cell(r, Some(date)))?,
                value: parse_amount(cell(r, Some(value)))?,
            })
        })
        .collect())
}
