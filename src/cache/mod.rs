//! Generation cache
//!
//! A positive cache recording "this artifact was confirmed present in storage".
//! Entries only ever assert presence; absence is never cached, so a missing
//! entry always falls through to a storage check.

pub mod keys;
pub mod memory;
pub mod persistence;

pub use keys::CacheKeyBuilder;
pub use memory::MemoryGenerationCache;
pub use persistence::SledGenerationCache;

use crate::error::CacheError;
use std::time::Duration;

/// Key-value backend for generation markers.
///
/// `set` must be an atomic insert-with-expiry; no compare-and-swap is required.
/// A `ttl` of `None` stores the entry without expiry.
pub trait GenerationCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<bool>, CacheError>;
    fn set(&self, key: &str, value: bool, ttl: Option<Duration>) -> Result<(), CacheError>;
}

/// Cache that never stores anything. Every lookup misses, so each check falls
/// through to storage. Useful for debugging and for deployments without a
/// shared cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyGenerationCache;

impl GenerationCache for DummyGenerationCache {
    fn get(&self, _key: &str) -> Result<Option<bool>, CacheError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: bool, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Ok(())
    }
}
