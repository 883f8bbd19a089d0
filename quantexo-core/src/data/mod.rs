//! Data acquisition and cleaning: providers, CSV parsing, ingestion, sectors.

pub mod cache;
pub mod circuit_breaker;
pub mod csv_file;
pub mod csv_rows;
pub mod ingest;
pub mod provider;
pub mod sheet;
pub mod universe;

pub use cache::TtlCache;
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_file::CsvFileProvider;
pub use csv_rows::{read_rows, ColumnLayout};
pub use ingest::{
    coerce_number, ingest, parse_date, BadRow, IngestReport, Ingested, Strictness,
    ValidationError,
};
pub use provider::{filter_symbol, CandleProvider, DataSource, FetchError, MemoryProvider, RawRow};
pub use sheet::{download_csv, sheet_csv_url, SheetOptions, SheetProvider};
pub use universe::{SectorMap, UniverseError};
