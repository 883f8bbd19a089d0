//! Published daily-price sheet provider.
//!
//! The sheet is a single CSV export holding every symbol's daily rows. It is
//! downloaded once per TTL window, parsed positionally, and filtered per
//! symbol. Retries use exponential backoff; a shared circuit breaker stops
//! a batch scan from waiting out a timeout for every symbol during an outage.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::cache::TtlCache;
use super::circuit_breaker::CircuitBreaker;
use super::csv_rows::{read_rows, ColumnLayout};
use super::provider::{filter_symbol, CandleProvider, DataSource, FetchError, RawRow};

/// CSV export URL of one tab of a public Google Sheet.
pub fn sheet_csv_url(sheet_id: &str, gid: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv&gid={gid}")
}

/// One-shot download of a CSV document (a portfolio tab, for instance).
/// No cache, retries or breaker.
pub fn download_csv(url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;
    let resp = client.get(url).send().map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout {
                secs: timeout.as_secs(),
            }
        } else {
            FetchError::Network(e.to_string())
        }
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            provider: "sheet".into(),
            status: status.as_u16(),
        });
    }
    let body = resp
        .bytes()
        .map_err(|e| FetchError::Network(format!("reading body: {e}")))?;
    Ok(body.to_vec())
}

/// Network and resilience settings for [`SheetProvider`].
#[derive(Debug, Clone)]
pub struct SheetOptions {
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub breaker_cooldown: Duration,
    pub breaker_threshold: u32,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(3600),
            breaker_cooldown: Duration::from_secs(30 * 60),
            breaker_threshold: 3,
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Provider backed by the published price sheet.
pub struct SheetProvider {
    client: reqwest::blocking::Client,
    url: String,
    breaker: Arc<CircuitBreaker>,
    cache: TtlCache<Vec<RawRow>>,
    timeout: Duration,
    max_retries: u32,
    base_delay: Duration,
}

impl SheetProvider {
    pub fn new(url: impl Into<String>, options: &SheetOptions) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            breaker: Arc::new(CircuitBreaker::new(
                options.breaker_cooldown,
                options.breaker_threshold,
            )),
            cache: TtlCache::new(options.cache_ttl),
            timeout: options.timeout,
            max_retries: options.max_retries,
            base_delay: options.base_delay,
        })
    }

    /// Share a breaker with other providers hitting the same host.
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Drop the cached sheet so the next fetch downloads it again.
    pub fn refresh(&self) {
        self.cache.invalidate(&self.url);
    }

    /// All rows of the sheet, from cache when fresh.
    pub fn fetch_all(&self) -> Result<Arc<Vec<RawRow>>, FetchError> {
        if let Some(rows) = self.cache.get(&self.url) {
            debug!(url = %self.url, rows = rows.len(), "sheet cache hit");
            return Ok(rows);
        }
        debug!(url = %self.url, "sheet cache miss");
        self.cache
            .get_or_try_insert(&self.url, || self.download_with_retry())
    }

    fn open_error(&self) -> FetchError {
        FetchError::CircuitOpen {
            remaining_secs: self.breaker.remaining_cooldown().as_secs(),
        }
    }

    fn download_with_retry(&self) -> Result<Vec<RawRow>, FetchError> {
        if !self.breaker.is_allowed() {
            return Err(self.open_error());
        }

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(backoff_delay(self.base_delay, attempt));
            }
            if !self.breaker.is_allowed() {
                return Err(self.open_error());
            }

            match self.client.get(&self.url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN
                        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    {
                        self.breaker.trip();
                        warn!(url = %self.url, status = status.as_u16(), "sheet host refused request; circuit breaker open");
                        return Err(FetchError::HttpStatus {
                            provider: "sheet".into(),
                            status: status.as_u16(),
                        });
                    }

                    if !status.is_success() {
                        self.breaker.record_failure();
                        last_error = Some(FetchError::HttpStatus {
                            provider: "sheet".into(),
                            status: status.as_u16(),
                        });
                        continue;
                    }

                    let body = resp
                        .bytes()
                        .map_err(|e| FetchError::Network(format!("reading sheet body: {e}")))?;
                    let rows = read_rows(body.as_ref(), ColumnLayout::Positional)?;
                    self.breaker.record_success();
                    info!(rows = rows.len(), "downloaded price sheet");
                    return Ok(rows);
                }
                Err(e) => {
                    self.breaker.record_failure();
                    last_error = Some(if e.is_timeout() {
                        FetchError::Timeout {
                            secs: self.timeout.as_secs(),
                        }
                    } else {
                        FetchError::Network(e.to_string())
                    });
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Network("max retries exceeded".into())))
    }
}

impl CandleProvider for SheetProvider {
    fn name(&self) -> &str {
        "sheet"
    }

    fn source(&self) -> DataSource {
        DataSource::Sheet
    }

    fn fetch_daily(&self, symbol: &str) -> Result<Vec<RawRow>, FetchError> {
        let all = self.fetch_all()?;
        Ok(filter_symbol(&all, symbol))
    }
}

/// Exponential backoff before retry `attempt` (1-based), saturating.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}
