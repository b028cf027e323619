//! Cache key derivation.
//!
//! Keys have the shape `<prefix>:<namespace>:<artifact name>`. With memcached-safe
//! keys enabled, names that would produce an over-long key or contain whitespace
//! or control characters are replaced by their blake3 digest.

/// Longest key memcached accepts.
pub const MAX_SAFE_KEY_LEN: usize = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    prefix: String,
    namespace: String,
    memcached_safe: bool,
}

impl CacheKeyBuilder {
    pub fn new(prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches(':').to_string(),
            namespace: namespace.into(),
            memcached_safe: true,
        }
    }

    pub fn with_memcached_safe(mut self, enabled: bool) -> Self {
        self.memcached_safe = enabled;
        self
    }

    /// Cache key for an artifact storage name.
    pub fn key_for(&self, name: &str) -> String {
        let key = self.join(name);
        if self.memcached_safe && !is_memcached_safe(&key) {
            let digest = blake3::hash(name.as_bytes());
            return self.join(&hex::encode(digest.as_bytes()));
        }
        key
    }

    fn join(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            format!("{}:{}", self.namespace, name)
        } else {
            format!("{}:{}:{}", self.prefix, self.namespace, name)
        }
    }
}

impl Default for CacheKeyBuilder {
    fn default() -> Self {
        Self::new("cachekit", "generation")
    }
}

fn is_memcached_safe(key: &str) -> bool {
    key.len() <= MAX_SAFE_KEY_LEN && !key.chars().any(|c| c.is_whitespace() || c.is_control())
}
