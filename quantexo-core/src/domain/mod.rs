//! Domain types for Quantexo

pub mod candle;
pub mod scan_result;
pub mod signal;

pub use candle::{Candle, CandleSeries, SeriesError};
pub use scan_result::ScanResult;
pub use signal::{SignalKind, UnknownSignal};
