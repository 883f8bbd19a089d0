//! In-process TTL cache for fetched sheet data.
//!
//! The sheet is one document holding every symbol, so a batch scan would
//! otherwise download it once per symbol. Entries live for a fixed
//! time-to-live; an expired entry is treated as absent. Concurrent misses
//! on a cold key run a single fetch; the other callers wait for its result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Thread-safe map of `key → (fetched_at, value)` with a fixed time-to-live.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, (Instant, Arc<T>)>>,
    /// Held for the duration of a fetch.
    fetching: Mutex<()>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fetching: Mutex::new(()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (Instant, Arc<T>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh value for `key`, if any. Expired entries are evicted.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some((at, value)) if at.elapsed() < self.ttl => Some(Arc::clone(value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.lock()
            .insert(key.to_string(), (Instant::now(), Arc::clone(&value)));
        value
    }

    /// Cached value, or the result of `fetch` stored under `key`.
    ///
    /// At most one `fetch` runs at a time. A caller that waited on another
    /// caller's fetch re-checks the cache before fetching itself, so racing
    /// cold callers share one result. A failed fetch is not cached; the next
    /// waiter tries again.
    pub fn get_or_try_insert<E>(
        &self,
        key: &str,
        fetch: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let _guard = self.fetching.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let value = fetch()?;
        Ok(self.insert(key, value))
    }

    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
