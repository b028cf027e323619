//! CLI route table over a temporary workspace

use super::test_utils::png_bytes;
use cachekit::batch::BatchReport;
use cachekit::cli::{Commands, OutputFormat, RunContext};
use cachekit::config::{CacheBackend, CacheKitConfig, SpecConfig};
use cachekit::error::ApiError;
use cachekit::generator::{GeneratorKind, ImageFormat};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let photos = temp_dir.path().join("media/photos");
    fs::create_dir_all(&photos).unwrap();
    fs::write(photos.join("a.png"), png_bytes(40, 20)).unwrap();
    fs::write(photos.join("b.png"), png_bytes(20, 40)).unwrap();
    temp_dir
}

fn config(backend: CacheBackend) -> CacheKitConfig {
    let mut config = CacheKitConfig::default();
    config.cache.backend = backend;
    config.specs.insert(
        "thumb:small".to_string(),
        SpecConfig {
            kind: GeneratorKind::Thumbnail,
            width: Some(10),
            height: Some(10),
            format: Some(ImageFormat::Png),
            pre_cache: true,
        },
    );
    config.specs.insert(
        "thumb:large".to_string(),
        SpecConfig {
            kind: GeneratorKind::Resize,
            width: Some(30),
            height: Some(30),
            format: Some(ImageFormat::Jpeg),
            pre_cache: false,
        },
    );
    config
        .specs
        .insert("copy:original".to_string(), SpecConfig::passthrough());
    config
}

fn context(root: &Path, backend: CacheBackend) -> RunContext {
    RunContext::from_config(root.to_path_buf(), config(backend)).unwrap()
}

fn generate(patterns: &[&str], format: OutputFormat) -> Commands {
    Commands::Generate {
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        format,
    }
}

#[test]
fn test_generate_text_output() {
    let temp_dir = workspace();
    let ctx = context(temp_dir.path(), CacheBackend::Memory);

    let output = ctx.execute(&generate(&["thumb:*"], OutputFormat::Text)).unwrap();
    assert_eq!(output.exit_code, 0);
    let lines: Vec<&str> = output.text.lines().collect();
    // Specs register in id order: thumb:large before thumb:small
    assert_eq!(lines[0], "Validating generator: thumb:large");
    assert!(lines[1].ends_with("[generated]"));
    assert!(lines.contains(&"Validating generator: thumb:small"));
    assert!(!output.text.contains("copy:original"));
    assert!(lines
        .last()
        .unwrap()
        .starts_with("Generators: 2, artifacts: 4, generated: 4"));
}

#[test]
fn test_generate_is_idempotent_across_contexts() {
    let temp_dir = workspace();
    {
        let ctx = context(temp_dir.path(), CacheBackend::Sled);
        let output = ctx.execute(&generate(&[], OutputFormat::Json)).unwrap();
        let report: BatchReport = serde_json::from_str(&output.text).unwrap();
        assert_eq!(report.summary.generated, 6);
    }

    let ctx = context(temp_dir.path(), CacheBackend::Sled);
    let output = ctx.execute(&generate(&[], OutputFormat::Json)).unwrap();
    let report: BatchReport = serde_json::from_str(&output.text).unwrap();
    assert_eq!(report.summary.generated, 0);
    assert_eq!(report.summary.skipped, 6);
    assert!(temp_dir.path().join(".cachekit/generation-cache").exists());
}

#[test]
fn test_undecodable_source_sets_exit_code() {
    let temp_dir = workspace();
    fs::write(temp_dir.path().join("media/photos/broken.png"), b"not a png").unwrap();
    let ctx = context(temp_dir.path(), CacheBackend::Memory);

    let output = ctx.execute(&generate(&["thumb:small"], OutputFormat::Text)).unwrap();
    assert_eq!(output.exit_code, 1);
    assert!(output.text.contains("[FAILED: "));

    // Passthrough copies bytes without decoding
    let output = ctx.execute(&generate(&["copy"], OutputFormat::Text)).unwrap();
    assert_eq!(output.exit_code, 0);
}

#[test]
fn test_bad_pattern_is_an_error() {
    let temp_dir = workspace();
    let ctx = context(temp_dir.path(), CacheBackend::Memory);
    let err = ctx.execute(&generate(&["***"], OutputFormat::Text)).unwrap_err();
    assert!(matches!(err, ApiError::Pattern(_)));
}

#[test]
fn test_list_selected_generators() {
    let temp_dir = workspace();
    let ctx = context(temp_dir.path(), CacheBackend::Memory);

    let output = ctx
        .execute(&Commands::List {
            patterns: vec!["thumb".to_string()],
            format: OutputFormat::Json,
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    let generators = value["generators"].as_array().unwrap();
    assert_eq!(generators.len(), 2);
    assert_eq!(generators[0]["id"], "thumb:large");
    assert_eq!(generators[1]["pre_cache"], true);
}

#[test]
fn test_url_then_clear() {
    let temp_dir = workspace();
    let ctx = context(temp_dir.path(), CacheBackend::Memory);

    let output = ctx
        .execute(&Commands::Url {
            accessor: "thumb:small".to_string(),
            source: "photos/a.png".to_string(),
            format: OutputFormat::Text,
        })
        .unwrap();
    assert!(output.text.starts_with("/media/CACHE/images/photos/a/"));
    let relative = output.text.trim_start_matches("/media/");
    assert!(temp_dir.path().join("media").join(relative).exists());

    let output = ctx
        .execute(&Commands::Clear {
            source: "photos/a.png".to_string(),
        })
        .unwrap();
    assert_eq!(output.exit_code, 0);
    assert!(output.text.starts_with("Removed 1 artifact(s) for photos/a.png"));
    assert!(!temp_dir.path().join("media").join(relative).exists());
    assert!(!temp_dir.path().join("media/CACHE/images/photos").exists());
}

#[test]
fn test_url_for_unknown_source_or_accessor() {
    let temp_dir = workspace();
    let ctx = context(temp_dir.path(), CacheBackend::Memory);

    let err = ctx
        .execute(&Commands::Url {
            accessor: "thumb:small".to_string(),
            source: "photos/missing.png".to_string(),
            format: OutputFormat::Text,
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::SourceNotFound(_)));

    let err = ctx
        .execute(&Commands::Url {
            accessor: "thumb:huge".to_string(),
            source: "photos/a.png".to_string(),
            format: OutputFormat::Text,
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Lifecycle(_)));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = workspace();
    let mut config = config(CacheBackend::Memory);
    config.specs.insert(
        "bad:*".to_string(),
        SpecConfig::passthrough(),
    );
    let err = RunContext::from_config(temp_dir.path().to_path_buf(), config)
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::ConfigError(_)));
}
