//! Time-bounded memo for loaded tables.
//!
//! The caller passes the current [`Instant`] into every lookup, so expiry
//! is deterministic under test.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

struct Entry<T> {
    loaded_at: Instant,
    value: Arc<T>,
}

/// Keyed cache whose entries expire `ttl` after they were loaded.
pub struct TableCache<T> {
    ttl: Duration,
    entries: HashMap<String, Entry<T>>,
}

impl<T> TableCache<T> {
    /// Empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value for `key` if it is still fresh at `now`,
    /// otherwise runs `load` and caches its result.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` returns. A failed load caches nothing and
    /// leaves any stale entry in place.
    pub fn get_or_load<E>(
        &mut self,
        key: &str,
        now: Instant,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        if let Some(entry) = self.entries.get(key) {
            if now.saturating_duration_since(entry.loaded_at) < self.ttl {
                return Ok(Arc::clone(&entry.value));
            }
            debug!(key, "cache entry expired");
        }
        let value = Arc::new(load()?);
        self.entries.insert(
            key.to_string(),
            Entry {
                loaded_at: now,
                value: Arc::clone(&value),
            },
        );
        Ok(value)
    }

    /// Drops one entry. Returns whether it was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
