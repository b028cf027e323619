//! Merge rules: built-in defaults applied beneath every file and env source.

use crate::config::DEFAULT_TTL_SECS;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("cache.backend", "sled")?
        .set_default("cache.prefix", "cachekit:")?
        .set_default("cache.namespace", "generation")?
        .set_default("cache.ttl_secs", DEFAULT_TTL_SECS as i64)?
        .set_default("cache.path", ".cachekit/generation-cache")?
        .set_default("cache.memcached_safe_keys", true)?
        .set_default("storage.root", "media")?
        .set_default("storage.base_url", "/media/")?
        .set_default("storage.source_dir", "")?
        .set_default("storage.cache_dir", "CACHE/images")?
        .set_default("storage.namer", "source_name_as_path")?
        .set_default("lifecycle.strategy", "just_in_time")?
        .set_default("lifecycle.pre_cache_on_create", false)
}
