//! In-process generation cache.

use crate::cache::GenerationCache;
use crate::error::CacheError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: bool,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Mutex-guarded map with lazy expiry. Expired entries are dropped on read.
#[derive(Debug, Default)]
pub struct MemoryGenerationCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryGenerationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry, as if all of them had expired.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GenerationCache for MemoryGenerationCache {
    fn get(&self, key: &str) -> Result<Option<bool>, CacheError> {
        let mut entries = self.entries.lock();
        match entries.get(key).copied() {
            Some(entry) if entry.is_expired(Instant::now()) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: bool, ttl: Option<Duration>) -> Result<(), CacheError> {
        // A TTL past the clock's range never expires.
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries
            .lock()
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}
