//! Candle signal detection.

pub mod cooldown;
pub mod detector;
pub mod params;

pub use cooldown::TagLedger;
pub use detector::{detect, Detection, SignalDetector};
pub use params::{DetectorParams, InvalidParams};
