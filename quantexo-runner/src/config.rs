//! TOML configuration for scans, data access and export.
//!
//! Every section is optional; a missing section or key takes its default.
//!
//! ```toml
//! [data]
//! sheet_url = "https://docs.google.com/spreadsheets/d/<id>/export?format=csv&gid=0"
//! timeout_secs = 30
//!
//! [detector]
//! aggressive_volume_mult = 2.0
//!
//! [scan]
//! batch_window = 10
//! threads = 4
//!
//! [export]
//! market = "NEPSE"
//!
//! [universe.sectors]
//! "Hydro Power" = ["AKPL", "API"]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use quantexo_core::data::{SectorMap, SheetOptions, Strictness};
use quantexo_core::detect::DetectorParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantexoConfig {
    pub data: DataConfig,
    pub detector: DetectorParams,
    pub scan: ScanConfig,
    pub export: ExportConfig,
    /// Sector override; `None` uses the built-in NEPSE map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universe: Option<SectorMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV export URL of the daily-price sheet.
    pub sheet_url: Option<String>,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub breaker_cooldown_secs: u64,
    pub breaker_threshold: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sheet_url: None,
            timeout_secs: 30,
            cache_ttl_secs: 3600,
            breaker_cooldown_secs: 30 * 60,
            breaker_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Most recent candles kept per symbol in a batch scan.
    pub batch_window: usize,
    /// Symbols with fewer candles in the window are skipped.
    pub min_candles: usize,
    /// Worker threads for batch scans; 0 lets rayon decide.
    pub threads: usize,
    pub single_strictness: Strictness,
    pub batch_strictness: Strictness,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_window: 10,
            min_candles: 4,
            threads: 0,
            single_strictness: Strictness::Strict,
            batch_strictness: Strictness::Lenient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub app: String,
    pub market: String,
    /// Offset applied to the export timestamp (345 = UTC+05:45, Kathmandu).
    pub utc_offset_minutes: i32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            app: "Quantexo".into(),
            market: "NEPSE".into(),
            utc_offset_minutes: 5 * 60 + 45,
        }
    }
}

impl QuantexoConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: QuantexoConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.scan.min_candles < 4 {
            return Err(ConfigError::Invalid(format!(
                "scan.min_candles must be at least 4, got {}",
                self.scan.min_candles
            )));
        }
        if self.scan.batch_window < self.scan.min_candles {
            return Err(ConfigError::Invalid(format!(
                "scan.batch_window ({}) is smaller than scan.min_candles ({})",
                self.scan.batch_window, self.scan.min_candles
            )));
        }
        for (name, value) in [
            ("data.timeout_secs", self.data.timeout_secs),
            ("data.cache_ttl_secs", self.data.cache_ttl_secs),
            ("data.breaker_cooldown_secs", self.data.breaker_cooldown_secs),
            ("data.breaker_threshold", u64::from(self.data.breaker_threshold)),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if self.export.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Invalid(format!(
                "export.utc_offset_minutes out of range: {}",
                self.export.utc_offset_minutes
            )));
        }
        if let Some(universe) = &self.universe {
            if universe.is_empty() {
                return Err(ConfigError::Invalid(
                    "universe.sectors is present but empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Network settings for the sheet provider.
    pub fn sheet_options(&self) -> SheetOptions {
        SheetOptions {
            timeout: Duration::from_secs(self.data.timeout_secs),
            cache_ttl: Duration::from_secs(self.data.cache_ttl_secs),
            breaker_cooldown: Duration::from_secs(self.data.breaker_cooldown_secs),
            breaker_threshold: self.data.breaker_threshold,
            ..SheetOptions::default()
        }
    }

    /// The configured sector map, or the built-in one.
    pub fn sector_map(&self) -> SectorMap {
        match &self.universe {
            Some(map) => SectorMap::new(map.sectors.clone()),
            None => SectorMap::default_nepse(),
        }
    }
}
