//! Quantexo CLI: volume/price-action signal scanner for NEPSE daily data.
//!
//! Commands:
//! - `detect`: tag one symbol's full history and list its signals
//! - `scan`: latest signal per symbol across the sector universe
//! - `portfolio`: value holdings and returns from CSV files or sheet tabs
//! - `sectors`: list the sector universe
//! - `signals`: reference table of the eight signal kinds

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quantexo_core::data::{
    BadRow, CandleProvider, ColumnLayout, CsvFileProvider, IngestReport, SheetProvider,
    ValidationError,
};
use quantexo_core::domain::{ScanResult, SignalKind};
use quantexo_runner::{
    export_signals_csv, load_portfolio, save_scan_export, scan_symbol, scan_universe,
    LoadedPortfolio, LogProgress, PortfolioSources, QuantexoConfig, ScanError, Selection,
    TableSource,
};

#[derive(Parser)]
#[command(name = "quantexo", about = "Quantexo: NEPSE volume and price-action signal scanner")]
struct Cli {
    /// TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (e.g. `debug`, `quantexo_runner=trace`). Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    /// First seven columns: date, symbol, open, high, low, close, volume.
    Positional,
    /// Columns located by header name.
    Named,
}

impl From<Layout> for ColumnLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Positional => ColumnLayout::Positional,
            Layout::Named => ColumnLayout::Named,
        }
    }
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Read prices from a local CSV file instead of the configured sheet.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Column layout of `--csv`.
    #[arg(long, value_enum, default_value_t = Layout::Named)]
    layout: Layout,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect signals over one symbol's full history.
    Detect {
        /// Ticker symbol (case-insensitive).
        symbol: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Print signals as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write the signal list as CSV to this file.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Scan the sector universe for each symbol's latest signal.
    Scan {
        /// Restrict to one sector.
        #[arg(long, conflicts_with = "symbols")]
        sector: Option<String>,

        /// Restrict to these symbols.
        #[arg(long, num_args = 1..)]
        symbols: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,

        /// Print results as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write the timestamped scan export into this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Value a portfolio from CSV files or public sheet tabs.
    Portfolio {
        /// Holdings CSV (Symbol, Quantity, Avg Buy Price, Last Traded Price, Prev Close Price).
        #[arg(long, required_unless_present = "sheet_id")]
        holdings: Option<PathBuf>,
        #[arg(long)]
        transactions: Option<PathBuf>,
        #[arg(long)]
        dividends: Option<PathBuf>,
        #[arg(long)]
        history: Option<PathBuf>,

        /// Public sheet id holding the portfolio tabs.
        #[arg(long, conflicts_with = "holdings")]
        sheet_id: Option<String>,
        #[arg(long, default_value = "0")]
        holdings_gid: String,
        #[arg(long)]
        transactions_gid: Option<String>,
        #[arg(long)]
        dividends_gid: Option<String>,
        #[arg(long)]
        history_gid: Option<String>,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List sectors, or the members of one sector.
    Sectors {
        sector: Option<String>,

        /// Print the sector map as TOML (usable as `[universe]` config).
        #[arg(long, default_value_t = false)]
        toml: bool,
    },
    /// Describe the signal kinds.
    Signals,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let config = match &cli.config {
        Some(path) => QuantexoConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => QuantexoConfig::default(),
    };

    match cli.command {
        Commands::Detect {
            symbol,
            source,
            json,
            export,
        } => run_detect(&config, &symbol, &source, json, export.as_deref()),
        Commands::Scan {
            sector,
            symbols,
            source,
            json,
            output_dir,
        } => run_scan(
            &config,
            sector.as_deref(),
            &symbols,
            &source,
            json,
            output_dir.as_deref(),
        ),
        Commands::Portfolio {
            holdings,
            transactions,
            dividends,
            history,
            sheet_id,
            holdings_gid,
            transactions_gid,
            dividends_gid,
            history_gid,
            json,
        } => {
            let sources = match (sheet_id, holdings) {
                (Some(id), _) => PortfolioSources::from_sheet(
                    &id,
                    &holdings_gid,
                    transactions_gid.as_deref(),
                    dividends_gid.as_deref(),
                    history_gid.as_deref(),
                ),
                (None, Some(holdings)) => PortfolioSources {
                    holdings: TableSource::File(holdings),
                    transactions: transactions.map(TableSource::File),
                    dividends: dividends.map(TableSource::File),
                    history: history.map(TableSource::File),
                },
                (None, None) => bail!("one of --holdings or --sheet-id is required"),
            };
            run_portfolio(&config, &sources, json)
        }
        Commands::Sectors { sector, toml } => run_sectors(&config, sector.as_deref(), toml),
        Commands::Signals => {
            print_signal_reference();
            Ok(())
        }
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid --log-level '{directives}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn provider(config: &QuantexoConfig, source: &SourceArgs) -> Result<Box<dyn CandleProvider>> {
    if let Some(path) = &source.csv {
        return Ok(Box::new(CsvFileProvider::new(path, source.layout.into())));
    }
    let Some(url) = config.data.sheet_url.as_deref() else {
        bail!("no price source: pass --csv FILE or set [data] sheet_url in the config");
    };
    Ok(Box::new(SheetProvider::new(url, &config.sheet_options())?))
}

fn run_detect(
    config: &QuantexoConfig,
    symbol: &str,
    source: &SourceArgs,
    json: bool,
    export: Option<&Path>,
) -> Result<()> {
    let provider = provider(config, source)?;
    let scan = match scan_symbol(provider.as_ref(), symbol, config) {
        Ok(scan) => scan,
        Err(ScanError::EmptyData { symbol }) => {
            println!("No data for {symbol}.");
            return Ok(());
        }
        Err(ScanError::Validation(e)) => {
            print_validation_diagnostic(&e);
            bail!("{symbol}: {e}");
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = export {
        std::fs::write(path, export_signals_csv(scan.signals())?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "signals exported");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(scan.signals())?);
        return Ok(());
    }

    print_ingest_report(scan.series().symbol(), &scan.report, &scan.dataset_hash);
    println!("Source:         {:?}", scan.source);
    if scan.signals().is_empty() {
        println!("No signals detected.");
        return Ok(());
    }
    print_results(scan.signals(), false);
    Ok(())
}

fn run_scan(
    config: &QuantexoConfig,
    sector: Option<&str>,
    symbols: &[String],
    source: &SourceArgs,
    json: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    let provider = provider(config, source)?;
    let sectors = config.sector_map();
    let selection = match (sector, symbols.is_empty()) {
        (Some(name), _) => Selection::Sector(name),
        (None, false) => Selection::Symbols(symbols),
        (None, true) => Selection::All,
    };

    let scan = scan_universe(provider.as_ref(), &sectors, selection, config, &LogProgress, None)?;

    if let Some(dir) = output_dir {
        let path = save_scan_export(&scan.results, dir, &config.export)?;
        println!("Export saved to: {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&scan.results)?);
        return Ok(());
    }

    let s = &scan.summary;
    println!();
    println!(
        "Scanned {}/{} symbols: {} with signals, {} empty, {} too short, {} failed",
        s.scanned,
        s.total,
        s.with_signal,
        s.skipped_empty,
        s.skipped_short,
        s.failed.len()
    );
    for (symbol, message) in &s.failed {
        println!("  skipped {symbol}: {message}");
    }
    println!();
    if scan.results.is_empty() {
        println!("No signals in the last {} candles.", config.scan.batch_window);
        return Ok(());
    }
    print_results(&scan.results, true);
    Ok(())
}

fn run_portfolio(config: &QuantexoConfig, sources: &PortfolioSources, json: bool) -> Result<()> {
    let loaded = load_portfolio(sources, Duration::from_secs(config.data.timeout_secs))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&loaded.report)?);
        return Ok(());
    }
    print_portfolio(&loaded);
    Ok(())
}

fn run_sectors(config: &QuantexoConfig, sector: Option<&str>, toml: bool) -> Result<()> {
    let map = config.sector_map();
    if toml {
        print!("{}", map.to_toml()?);
        return Ok(());
    }
    if let Some(name) = sector {
        let symbols = map.sector_symbols(name)?;
        println!("{name} ({} symbols)", symbols.len());
        for chunk in symbols.chunks(8) {
            println!("  {}", chunk.join("  "));
        }
        return Ok(());
    }
    println!("{:<32} {:>7}", "Sector", "Symbols");
    println!("{}", "-".repeat(40));
    for (name, symbols) in &map.sectors {
        println!("{:<32} {:>7}", name, symbols.len());
    }
    println!("{}", "-".repeat(40));
    println!("{:<32} {:>7}", "Total (unique)", map.symbol_count());
    Ok(())
}

// ── Output ──

fn print_results(results: &[ScanResult], with_sector: bool) {
    if with_sector {
        println!("{:<12} {:<10} {:<28} {:<4} Signal", "Date", "Symbol", "Sector", "");
        println!("{}", "-".repeat(80));
    } else {
        println!("{:<12} {:<10} {:>10} {:>12} {:<4} Signal", "Date", "Symbol", "Close", "Volume", "");
        println!("{}", "-".repeat(70));
    }
    for r in results {
        if with_sector {
            println!(
                "{:<12} {:<10} {:<28} {:<4} {}",
                r.date.to_string(),
                r.symbol,
                r.sector.as_deref().unwrap_or("-"),
                r.tag.glyph(),
                r.tag.label()
            );
        } else {
            println!(
                "{:<12} {:<10} {:>10} {:>12} {:<4} {}",
                r.date.to_string(),
                r.symbol,
                r.price.map(|p| format!("{p:.2}")).unwrap_or_default(),
                r.volume.map(|v| format!("{v:.0}")).unwrap_or_default(),
                r.tag.glyph(),
                r.tag.label()
            );
        }
    }
}

fn print_ingest_report(symbol: &str, report: &IngestReport, dataset_hash: &str) {
    println!();
    println!("=== {symbol} ===");
    println!("Rows:           {} read, {} kept", report.rows_in, report.rows_kept);
    println!("Dataset:        {}", &dataset_hash[..dataset_hash.len().min(16)]);
    if report.duplicates > 0 {
        println!("Duplicates:     {} (first kept)", report.duplicates);
    }
    if report.bad_dates + report.bad_numbers > 0 {
        println!(
            "Dropped:        {} bad dates, {} bad numbers",
            report.bad_dates, report.bad_numbers
        );
    }
    if report.inverted > 0 {
        println!("WARNING: {} candles with high/low not bracketing open/close", report.inverted);
    }
    println!();
}

fn print_validation_diagnostic(error: &ValidationError) {
    let examples: &[BadRow] = match error {
        ValidationError::InvalidDates { examples, .. } => examples,
        ValidationError::InvalidNumbers { examples, .. } => examples,
        _ => return,
    };
    eprintln!("{:>6}  {:<20} Value", "Row", "Date");
    for bad in examples {
        eprintln!("{:>6}  {:<20} '{}'", bad.row + 1, bad.date, bad.value);
    }
}

fn print_portfolio(loaded: &LoadedPortfolio) {
    let report = &loaded.report;
    println!();
    println!(
        "{:<10} {:>8} {:>10} {:>10} {:>14} {:>14} {:>12} {:>8}",
        "Symbol", "Qty", "Avg", "LTP", "Value", "Unrealised", "Day P&L", "P&L %"
    );
    println!("{}", "-".repeat(94));
    for h in &report.holdings {
        println!(
            "{:<10} {:>8.0} {:>10.2} {:>10.2} {:>14.2} {:>14.2} {:>12.2} {:>8}",
            h.holding.symbol,
            h.holding.quantity,
            h.holding.avg_buy_price,
            h.holding.last_traded_price,
            h.current_value,
            h.unrealised,
            h.daily_pnl,
            h.pnl_pct.map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".into())
        );
    }

    let s = &report.summary;
    println!();
    println!("--- Summary ---");
    println!("Total Value:    {:.2}", s.total_value);
    println!("Invested:       {:.2}", s.total_invested);
    println!("Unrealised:     {:.2} ({:.2}%)", s.total_unrealised, s.overall_return_pct);
    println!("Day P&L:        {:.2}", s.total_daily_pnl);
    println!("Realised:       {:.2}", s.realised_pnl);
    println!("Dividends:      {:.2}", s.dividend_income);
    println!("Total Realised: {:.2}", s.total_realised);

    if let Some(last) = loaded.performance.last() {
        println!();
        println!("--- History ---");
        println!(
            "{} points, {:.2}% cumulative as of {}",
            loaded.performance.len(),
            last.cumulative_return_pct,
            last.date
        );
    }
    println!();
}

fn print_signal_reference() {
    for kind in SignalKind::ALL {
        println!("{} {} ({})", kind.glyph(), kind.label(), kind.key());
        println!("    {}", kind.description());
        println!("    {}", kind.interpretation());
        println!();
    }
}
