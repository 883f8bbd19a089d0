//! Export round-trips and file output.

use chrono::NaiveDate;
use quantexo_core::data::{MemoryProvider, RawRow};
use quantexo_core::domain::SignalKind;
use quantexo_runner::{
    export_scan_csv, export_signals_csv, import_scan_csv, save_scan_export, scan_symbol,
    ExportConfig, QuantexoConfig,
};

fn rows(symbol: &str, data: &[(f64, f64, f64, f64, f64)]) -> Vec<RawRow> {
    let base = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c, v))| {
            let date = (base + chrono::Duration::days(i as i64)).to_string();
            RawRow::from_values(&date, symbol, o, h, l, c, v)
        })
        .collect()
}

/// Two aggressive signals ten candles apart (outside the cooldown).
fn provider() -> MemoryProvider {
    let flat = (10.0, 10.0, 10.0, 10.0, 100.0);
    let mut data = vec![flat; 5];
    data.push((10.0, 15.0, 10.0, 15.0, 600.0));
    data.extend(vec![(15.0, 15.0, 15.0, 15.0, 100.0); 9]);
    data.push((15.0, 15.0, 10.0, 10.0, 600.0));
    MemoryProvider::new().with("NABIL", rows("NABIL", &data))
}

#[test]
fn detection_output_survives_csv_roundtrip() {
    let scan = scan_symbol(&provider(), "NABIL", &QuantexoConfig::default()).unwrap();
    let signals = scan.signals();
    assert_eq!(signals.len(), 2);
    assert_eq!(signals[0].tag, SignalKind::AggressiveBuying);
    assert_eq!(signals[1].tag, SignalKind::AggressiveSelling);

    let key = |r: &quantexo_core::domain::ScanResult| (r.date, r.symbol.clone(), r.tag);
    let expected: Vec<_> = signals.iter().map(key).collect();

    let back = import_scan_csv(&export_scan_csv(signals).unwrap()).unwrap();
    assert_eq!(back.iter().map(key).collect::<Vec<_>>(), expected);

    let back = import_scan_csv(&export_signals_csv(signals).unwrap()).unwrap();
    assert_eq!(back.iter().map(key).collect::<Vec<_>>(), expected);
    assert_eq!(back[0].price, Some(15.0));
    assert_eq!(back[1].volume, Some(600.0));
}

#[test]
fn save_writes_named_file_into_dir() {
    let scan = scan_symbol(&provider(), "NABIL", &QuantexoConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("exports");

    let path = save_scan_export(scan.signals(), &out, &ExportConfig::default()).unwrap();
    assert_eq!(path.parent(), Some(out.as_path()));

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("Detected.Signal__"), "{name}");
    assert!(name.ends_with("_Quantexo_NEPSE.csv"), "{name}");

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("date,symbol,sector,tag\n"));
    assert_eq!(import_scan_csv(&content).unwrap().len(), 2);
}

#[test]
fn custom_app_and_market_in_filename() {
    let dir = tempfile::tempdir().unwrap();
    let export = ExportConfig {
        app: "Scanner".into(),
        market: "TEST".into(),
        utc_offset_minutes: 0,
    };
    let path = save_scan_export(&[], dir.path(), &export).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with("_Scanner_TEST.csv"), "{name}");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "date,symbol,sector,tag\n");
}
