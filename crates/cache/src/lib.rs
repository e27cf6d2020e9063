//! # Cache — a byte-budgeted map of recently read values
//!
//! The engine's read cache: key → [`Bytes`], with a running total of the
//! cached value sizes that never exceeds the configured budget. Values are
//! handed out as cheap `Bytes` clones, so a reader keeps its bytes alive
//! even if the entry is busted underneath it.
//!
//! The cache does no locking of its own — the engine owns one and guards
//! it with its lock. It also decides nothing about *when* to cache:
//! population happens at read time (the siphon installs at end-of-file),
//! and writes only bust.

use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;

/// Non-fatal cache errors. The surrounding store operation still succeeds;
/// only the caching side effect is skipped.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The value alone exceeds the whole cache budget.
    #[error("value size ({value} bytes) too large for cache ({max} bytes)")]
    TooLarge { value: u64, max: u64 },
}

/// A byte-budgeted key→bytes map.
#[derive(Debug)]
pub struct Cache {
    map: HashMap<String, Bytes>,
    size: u64,
    max: u64,
}

impl Cache {
    /// An empty cache with the given byte budget. A budget of zero admits
    /// nothing but zero-length values.
    pub fn new(max: u64) -> Self {
        Self {
            map: HashMap::new(),
            size: 0,
            max,
        }
    }

    /// The byte budget.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Total bytes currently cached.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// The cached bytes for `key`, as a cheap clone.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.map.get(key).cloned()
    }

    /// Removes `key` if present, adjusting the running size. No-op for
    /// absent keys.
    pub fn bust(&mut self, key: &str) {
        if let Some(old) = self.map.remove(key) {
            self.size -= old.len() as u64;
        }
    }

    /// Inserts `value` under `key`, busting any prior entry first and
    /// evicting others until the value fits.
    ///
    /// Eviction order is the map's iteration order — unspecified, and not
    /// LRU; the only guarantee is that enough is evicted to fit. A value
    /// larger than the whole budget is rejected with
    /// [`CacheError::TooLarge`] and nothing is evicted.
    ///
    /// # Panics
    ///
    /// Panics if the value still does not fit after evicting everything:
    /// that means the size bookkeeping is broken, not that the cache is
    /// full.
    pub fn insert(&mut self, key: &str, value: Bytes) -> Result<(), CacheError> {
        self.bust(key);
        self.ensure_space(value.len() as u64)?;
        self.size += value.len() as u64;
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    /// Drops every entry and resets the running size.
    pub fn clear(&mut self) {
        self.map.clear();
        self.size = 0;
    }

    fn ensure_space(&mut self, incoming: u64) -> Result<(), CacheError> {
        if incoming > self.max {
            return Err(CacheError::TooLarge {
                value: incoming,
                max: self.max,
            });
        }

        while self.size + incoming > self.max {
            let Some(victim) = self.map.keys().next().cloned() else {
                break;
            };
            self.bust(&victim);
        }

        if self.size + incoming > self.max {
            panic!(
                "cache accounting broken: {} bytes won't fit in {} after eviction",
                incoming, self.max
            );
        }
        Ok(())
    }
}
