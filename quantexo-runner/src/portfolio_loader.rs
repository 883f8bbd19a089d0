//! Portfolio loading: reads the holdings, transactions, dividends and
//! history tables from local files or public sheet tabs, then values them.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use quantexo_core::data::{download_csv, sheet_csv_url, FetchError};
use quantexo_core::portfolio::{
    evaluate, performance, read_dividends, read_history, read_holdings, read_transactions,
    PerformancePoint, PortfolioError, PortfolioReport,
};

#[derive(Debug, Error)]
pub enum PortfolioLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to download {table} table: {source}")]
    Fetch {
        table: &'static str,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Table(#[from] PortfolioError),
}

/// Where one table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    File(PathBuf),
    Url(String),
}

/// Table sources. Only holdings are required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioSources {
    pub holdings: TableSource,
    pub transactions: Option<TableSource>,
    pub dividends: Option<TableSource>,
    pub history: Option<TableSource>,
}

impl PortfolioSources {
    /// Tabs of one public sheet, identified by gid.
    pub fn from_sheet(
        sheet_id: &str,
        holdings_gid: &str,
        transactions_gid: Option<&str>,
        dividends_gid: Option<&str>,
        history_gid: Option<&str>,
    ) -> Self {
        let tab = |gid: &str| TableSource::Url(sheet_csv_url(sheet_id, gid));
        Self {
            holdings: tab(holdings_gid),
            transactions: transactions_gid.map(tab),
            dividends: dividends_gid.map(tab),
            history: history_gid.map(tab),
        }
    }
}

/// A valued portfolio plus its value history.
#[derive(Debug, Clone)]
pub struct LoadedPortfolio {
    pub report: PortfolioReport,
    pub performance: Vec<PerformancePoint>,
}

/// Read every configured table and value the portfolio.
pub fn load_portfolio(
    sources: &PortfolioSources,
    timeout: Duration,
) -> Result<LoadedPortfolio, PortfolioLoadError> {
    let holdings = read_holdings(open(&sources.holdings, "holdings", timeout)?.as_slice())?;

    let transactions = match &sources.transactions {
        Some(src) => read_transactions(open(src, "transactions", timeout)?.as_slice())?,
        None => Vec::new(),
    };
    let dividends = match &sources.dividends {
        Some(src) => read_dividends(open(src, "dividends", timeout)?.as_slice())?,
        None => Vec::new(),
    };
    let history = match &sources.history {
        Some(src) => read_history(open(src, "history", timeout)?.as_slice())?,
        None => Vec::new(),
    };

    debug!(
        holdings = holdings.len(),
        transactions = transactions.len(),
        dividends = dividends.len(),
        history = history.len(),
        "portfolio tables loaded"
    );
    let report = evaluate(&holdings, &transactions, &dividends);
    info!(
        total_value = report.summary.total_value,
        holdings = report.holdings.len(),
        "portfolio valued"
    );

    Ok(LoadedPortfolio {
        report,
        performance: performance(&history),
    })
}

fn open(
    source: &TableSource,
    table: &'static str,
    timeout: Duration,
) -> Result<Vec<u8>, PortfolioLoadError> {
    match source {
        TableSource::File(path) => {
            let mut bytes = Vec::new();
            std::fs::File::open(path)
                .and_then(|mut f| f.read_to_end(&mut bytes))
                .map_err(|source| PortfolioLoadError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
            Ok(bytes)
        }
        TableSource::Url(url) => {
            download_csv(url, timeout).map_err(|source| PortfolioLoadError::Fetch { table, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &std::path::Path, name: &str, content: &str) -> TableSource {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        TableSource::File(path)
    }

    #[test]
    fn sheet_sources_build_tab_urls() {
        let sources = PortfolioSources::from_sheet("abc", "0", None, Some("7"), None);
        assert_eq!(
            sources.holdings,
            TableSource::Url(sheet_csv_url("abc", "0"))
        );
        assert!(sources.transactions.is_none());
        assert_eq!(sources.dividends, Some(TableSource::Url(sheet_csv_url("abc", "7"))));
    }

    #[test]
    fn loads_all_tables_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let sources = PortfolioSources {
            holdings: write(
                dir.path(),
                "holdings.csv",
                "Symbol,Quantity,Avg Buy Price,Last Traded Price,Prev Close Price\n\
                 NABIL,10,500,550,540\n",
            ),
            transactions: Some(write(
                dir.path(),
                "tx.csv",
                "Date,Symbol,Type,Quantity,Price\n\
                 2024-01-01,NICA,Buy,10,100\n\
                 2024-02-01,NICA,Sell,10,120\n",
            )),
            dividends: Some(write(
                dir.path(),
                "div.csv",
                "Date,Symbol,Amount\n2024-03-01,NABIL,\"1,000\"\n",
            )),
            history: Some(write(
                dir.path(),
                "history.csv",
                "Date,Portfolio Value\n2024-01-01,1000\n2024-01-02,1100\n",
            )),
        };

        let loaded = load_portfolio(&sources, Duration::from_secs(1)).unwrap();
        let s = &loaded.report.summary;
        assert_eq!(s.total_value, 5500.0);
        assert_eq!(s.total_invested, 5000.0);
        assert_eq!(s.total_daily_pnl, 100.0);
        assert_eq!(s.realised_pnl, 200.0);
        assert_eq!(s.dividend_income, 1000.0);
        assert_eq!(s.total_realised, 1200.0);
        assert_eq!(loaded.performance.len(), 2);
    }

    #[test]
    fn missing_holdings_file_is_read_error() {
        let sources = PortfolioSources {
            holdings: TableSource::File("/nonexistent/holdings.csv".into()),
            transactions: None,
            dividends: None,
            history: None,
        };
        let err = load_portfolio(&sources, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, PortfolioLoadError::Read { .. }));
    }
}
