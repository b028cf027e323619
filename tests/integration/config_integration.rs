//! Integration tests for configuration layering

use super::test_utils::env_lock;
use cachekit::config::{CacheBackend, ConfigLoader};
use cachekit::lifecycle::CacheFileStrategy;
use std::fs;
use tempfile::TempDir;

fn write_workspace_config(temp_dir: &TempDir, file: &str, contents: &str) {
    let dir = temp_dir.path().join("config");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), contents).unwrap();
}

#[test]
fn test_env_file_overrides_base_file() {
    let _guard = env_lock();
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        &temp_dir,
        "config.toml",
        "[cache]\nbackend = \"memory\"\nprefix = \"base\"\n",
    );
    write_workspace_config(&temp_dir, "staging.toml", "[cache]\nprefix = \"staging\"\n");

    std::env::set_var("CACHEKIT_ENV", "staging");
    let config = ConfigLoader::load(temp_dir.path());
    std::env::remove_var("CACHEKIT_ENV");

    let config = config.unwrap();
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.cache.prefix, "staging");
}

#[test]
fn test_environment_variables_override_files() {
    let _guard = env_lock();
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        &temp_dir,
        "config.toml",
        "[lifecycle]\nstrategy = \"just_in_time\"\n\n[cache]\nttl_secs = 60\n",
    );

    std::env::set_var("CACHEKIT__LIFECYCLE__STRATEGY", "optimistic");
    std::env::set_var("CACHEKIT__CACHE__TTL_SECS", "120");
    let config = ConfigLoader::load(temp_dir.path());
    std::env::remove_var("CACHEKIT__LIFECYCLE__STRATEGY");
    std::env::remove_var("CACHEKIT__CACHE__TTL_SECS");

    let config = config.unwrap();
    assert_eq!(config.lifecycle.strategy, CacheFileStrategy::Optimistic);
    assert_eq!(config.cache.ttl_secs, Some(120));
}

#[test]
fn test_specs_load_from_workspace_config() {
    let _guard = env_lock();
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        &temp_dir,
        "config.toml",
        r#"
[specs."thumbs:small"]
kind = "thumbnail"
width = 64
height = 64

[specs."thumbs:broken"]
kind = "resize"
"#,
    );

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.specs.len(), 2);
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().starts_with("Spec 'thumbs:broken'"));
}

#[test]
fn test_explicit_file_must_exist() {
    let _guard = env_lock();
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("missing.toml")).is_err());
}
