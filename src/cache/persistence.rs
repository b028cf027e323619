//! Persistent generation cache backed by sled
//!
//! Markers survive process restarts, so repeated batch runs on one machine skip
//! storage checks for artifacts confirmed within the TTL window.

use crate::cache::GenerationCache;
use crate::error::CacheError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// On-disk marker: value plus absolute expiry in unix milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct StoredEntry {
    value: bool,
    expires_at_ms: Option<i64>,
}

/// Sled-based implementation of GenerationCache
pub struct SledGenerationCache {
    db: sled::Db,
}

impl SledGenerationCache {
    /// Open (or create) a cache database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let db = sled::open(path)
            .map_err(|e| CacheError::Backend(format!("Failed to open sled database: {}", e)))?;
        Ok(Self { db })
    }

    /// Temporary database, removed when dropped
    pub fn temporary() -> Result<Self, CacheError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| CacheError::Backend(format!("Failed to open sled database: {}", e)))?;
        Ok(Self { db })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::Backend(format!("Failed to flush cache: {}", e)))?;
        Ok(())
    }

    /// Remove every expired marker and return how many were dropped
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now().timestamp_millis();
        let mut removed = 0;
        for item in self.db.iter() {
            let (key, value) =
                item.map_err(|e| CacheError::Backend(format!("Failed to scan cache: {}", e)))?;
            let expired = match bincode::deserialize::<StoredEntry>(&value) {
                Ok(entry) => is_expired(&entry, now),
                Err(_) => true,
            };
            if expired {
                self.db
                    .remove(&key)
                    .map_err(|e| CacheError::Backend(format!("Failed to purge entry: {}", e)))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn is_expired(entry: &StoredEntry, now_ms: i64) -> bool {
    entry.expires_at_ms.is_some_and(|at| now_ms >= at)
}

impl GenerationCache for SledGenerationCache {
    fn get(&self, key: &str) -> Result<Option<bool>, CacheError> {
        let raw = self
            .db
            .get(key.as_bytes())
            .map_err(|e| CacheError::Backend(format!("Failed to get cache entry: {}", e)))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let entry: StoredEntry =
            bincode::deserialize(&raw).map_err(|e| CacheError::CorruptEntry {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        if is_expired(&entry, Utc::now().timestamp_millis()) {
            self.db
                .remove(key.as_bytes())
                .map_err(|e| CacheError::Backend(format!("Failed to drop expired entry: {}", e)))?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: bool, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at_ms = ttl.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            Utc::now().timestamp_millis().saturating_add(ttl_ms)
        });
        let entry = StoredEntry {
            value,
            expires_at_ms,
        };
        let encoded = bincode::serialize(&entry).map_err(|e| {
            CacheError::Backend(format!("Failed to serialize cache entry: {}", e))
        })?;

        self.db
            .insert(key.as_bytes(), encoded)
            .map_err(|e| CacheError::Backend(format!("Failed to put cache entry: {}", e)))?;

        Ok(())
    }
}
