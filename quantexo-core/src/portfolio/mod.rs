//! Portfolio valuation: holdings, realised P&L, dividends, value history.
//!
//! Pure arithmetic over tabular inputs. Reading the tables lives in
//! [`tables`]; everything else takes parsed rows.

pub mod history;
pub mod holdings;
pub mod ledger;
pub mod tables;

pub use history::{performance, HistoryPoint, PerformancePoint};
pub use holdings::{Holding, HoldingValuation};
pub use ledger::{dividend_income, realised_pnl, Dividend, TradeSide, Transaction};
pub use tables::{read_dividends, read_history, read_holdings, read_transactions};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("{table} table: unreadable CSV: {message}")]
    Csv { table: &'static str, message: String },

    #[error("{table} table missing required columns: {}", .missing.join(", "))]
    MissingColumns {
        table: &'static str,
        missing: Vec<String>,
    },
}

/// Parse a money or quantity cell: trims, drops thousands separators.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Totals across the whole portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_invested: f64,
    pub total_unrealised: f64,
    pub total_daily_pnl: f64,
    /// Unrealised P&L over invested, in percent; 0 when nothing is invested.
    pub overall_return_pct: f64,
    pub realised_pnl: f64,
    pub dividend_income: f64,
    /// Realised P&L plus dividend income.
    pub total_realised: f64,
}

/// Valued holdings plus portfolio totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub holdings: Vec<HoldingValuation>,
    pub summary: PortfolioSummary,
}

/// Value every holding and aggregate the totals.
pub fn evaluate(
    holdings: &[Holding],
    transactions: &[Transaction],
    dividends: &[Dividend],
) -> PortfolioReport {
    let valued: Vec<HoldingValuation> = holdings.iter().map(Holding::value).collect();

    let total_value: f64 = valued.iter().map(|h| h.current_value).sum();
    let total_invested: f64 = valued.iter().map(|h| h.invested).sum();
    let total_unrealised: f64 = valued.iter().map(|h| h.unrealised).sum();
    let total_daily_pnl: f64 = valued.iter().map(|h| h.daily_pnl).sum();
    let overall_return_pct = if total_invested > 0.0 {
        total_unrealised / total_invested * 100.0
    } else {
        0.0
    };
    let realised = realised_pnl(transactions);
    let dividends = dividend_income(dividends);

    PortfolioReport {
        holdings: valued,
        summary: PortfolioSummary {
            total_value,
            total_invested,
            total_unrealised,
            total_daily_pnl,
            overall_return_pct,
            realised_pnl: realised,
            dividend_income: dividends,
            total_realised: realised + dividends,
        },
    }
}
