//! Transactions and dividends: realised P&L and dividend income.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
    /// Anything else in the type column (bonus, rights, IPO...); ignored.
    Other,
}

impl TradeSide {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => TradeSide::Buy,
            "sell" => TradeSide::Sell,
            _ => TradeSide::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: Option<NaiveDate>,
    pub symbol: String,
    pub side: TradeSide,
    /// None when the cell was not numeric.
    pub quantity: Option<f64>,
    pub price: Option<f64>,
}

impl Transaction {
    pub fn new(
        date: Option<NaiveDate>,
        symbol: &str,
        side: TradeSide,
        quantity: Option<f64>,
        price: Option<f64>,
    ) -> Self {
        Self {
            date,
            symbol: symbol.trim().to_uppercase(),
            side,
            quantity,
            price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    pub date: Option<NaiveDate>,
    pub symbol: String,
    pub amount: f64,
}

impl Dividend {
    pub fn new(date: Option<NaiveDate>, symbol: &str, amount: f64) -> Self {
        Self {
            date,
            symbol: symbol.trim().to_uppercase(),
            amount,
        }
    }
}

/// Σ over sells of `(sell price - mean buy price of the symbol) × quantity`.
///
/// The mean is an unweighted average of buy prices. Sells of a symbol with no
/// priced buys, and sells with a missing price or quantity, contribute 0.
pub fn realised_pnl(transactions: &[Transaction]) -> f64 {
    let mut buys: HashMap<&str, (f64, usize)> = HashMap::new();
    for t in transactions.iter().filter(|t| t.side == TradeSide::Buy) {
        if let Some(price) = t.price {
            let entry = buys.entry(t.symbol.as_str()).or_insert((0.0, 0));
            entry.0 += price;
            entry.1 += 1;
        }
    }

    transactions
        .iter()
        .filter(|t| t.side == TradeSide::Sell)
        .filter_map(|t| {
            let (sum, count) = buys.get(t.symbol.as_str())?;
            let avg_buy = sum / *count as f64;
            Some((t.price? - avg_buy) * t.quantity?)
        })
        .sum()
}

pub fn dividend_income(dividends: &[Dividend]) -> f64 {
    dividends.iter().map(|d| d.amount).sum()
}
