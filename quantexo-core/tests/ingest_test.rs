//! Provider + ingest integration: CSV files on disk through to a series.

use std::io::Write;

use quantexo_core::data::{
    ingest, CandleProvider, ColumnLayout, CsvFileProvider, FetchError, Strictness,
    ValidationError,
};

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const SHEET: &str = "\
Date,Symbol,Open,High,Low,Close,Volume
2024-01-03,NABIL,\"1,010\",\"1,030\",\"1,000\",\"1,020\",\"12,500\"
2024-01-02,NABIL,1000,1015,995,1010,11000
2024-01-02, nica ,700,710,690,705,9000
2024-01-04,NABIL,1020,1040,1015,1035,13000
2024-01-04,NABIL,9999,9999,9999,9999,1
";

#[test]
fn positional_file_filters_sorts_and_dedupes() {
    let file = write_csv(SHEET);
    let provider = CsvFileProvider::new(file.path(), ColumnLayout::Positional);

    let raw = provider.fetch_daily("nabil").unwrap();
    assert_eq!(raw.len(), 4);

    let out = ingest("NABIL", &raw, Strictness::Strict).unwrap();
    let closes: Vec<f64> = out.series.candles().iter().map(|c| c.close).collect();
    assert_eq!(closes, vec![1010.0, 1020.0, 1035.0]);
    assert_eq!(out.report.duplicates, 1);
    assert_eq!(out.series.candles()[0].point_change, 0.0);
    assert_eq!(out.series.candles()[1].point_change, 10.0);
}

#[test]
fn symbol_lookup_trims_and_ignores_case() {
    let file = write_csv(SHEET);
    let provider = CsvFileProvider::new(file.path(), ColumnLayout::Positional);
    let raw = provider.fetch_daily("NICA").unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].symbol, "NICA");
}

#[test]
fn named_layout_single_symbol_export() {
    let file = write_csv(
        "close,volume,open,high,low,date\n\
         10,100,9,11,8,2024/02/01\n\
         11,150,10,12,9,2024/02/02\n",
    );
    let provider = CsvFileProvider::new(file.path(), ColumnLayout::Named);
    let raw = provider.fetch_daily("UPPER").unwrap();
    let out = ingest("UPPER", &raw, Strictness::Strict).unwrap();
    assert_eq!(out.series.len(), 2);
    assert_eq!(out.series.symbol(), "UPPER");
}

#[test]
fn named_layout_missing_columns_is_schema_error() {
    let file = write_csv("date,open,close\n2024-01-01,1,2\n");
    let provider = CsvFileProvider::new(file.path(), ColumnLayout::Named);
    match provider.fetch_daily("X").unwrap_err() {
        FetchError::Schema(ValidationError::MissingColumns { missing }) => {
            assert_eq!(missing, vec!["high", "low", "volume"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let provider = CsvFileProvider::new("/definitely/not/here.csv", ColumnLayout::Positional);
    assert!(matches!(provider.fetch_daily("X"), Err(FetchError::Io(_))));
}

#[test]
fn strict_diagnostic_names_column_and_rows() {
    let file = write_csv(
        "date,symbol,open,high,low,close,volume\n\
         2024-01-01,ADBL,1,2,1,2,-\n\
         2024-01-02,ADBL,1,2,1,2,100\n\
         2024-01-03,ADBL,1,2,1,2,\n",
    );
    let provider = CsvFileProvider::new(file.path(), ColumnLayout::Positional);
    let raw = provider.fetch_daily("ADBL").unwrap();

    let err = ingest("ADBL", &raw, Strictness::Strict).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("2 invalid values in volume column"), "{message}");
    assert!(message.contains("2024-01-03"), "{message}");

    let lenient = ingest("ADBL", &raw, Strictness::Lenient).unwrap();
    assert_eq!(lenient.series.len(), 1);
    assert_eq!(lenient.report.bad_numbers, 2);
}
