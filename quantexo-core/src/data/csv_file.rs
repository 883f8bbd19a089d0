//! Local CSV file provider, for offline runs and uploaded exports.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::csv_rows::{read_rows, ColumnLayout};
use super::provider::{filter_symbol, CandleProvider, DataSource, FetchError, RawRow};

/// Reads rows from a CSV file on every fetch.
#[derive(Debug, Clone)]
pub struct CsvFileProvider {
    path: PathBuf,
    layout: ColumnLayout,
}

impl CsvFileProvider {
    pub fn new(path: impl Into<PathBuf>, layout: ColumnLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every row in the file, unfiltered.
    pub fn read_all(&self) -> Result<Vec<RawRow>, FetchError> {
        let file = File::open(&self.path)?;
        Ok(read_rows(BufReader::new(file), self.layout)?)
    }
}

impl CandleProvider for CsvFileProvider {
    fn name(&self) -> &str {
        "csv_file"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvFile
    }

    fn fetch_daily(&self, symbol: &str) -> Result<Vec<RawRow>, FetchError> {
        Ok(filter_symbol(&self.read_all()?, symbol))
    }
}
