//! Record lifecycle against real filesystem storage

use super::test_utils::{memory_orchestrator, png_bytes};
use cachekit::artifact::{ArtifactFactory, SourceRecord};
use cachekit::generator::{GeneratorDescriptor, ImageFormat, Thumbnail};
use cachekit::lifecycle::{
    ArtifactLifecycleBinding, ArtifactState, CacheFileStrategy, LifecyclePolicy, RecordType,
};
use cachekit::orchestrator::Outcome;
use cachekit::registry::SpecRegistry;
use cachekit::storage::{save, ArtifactStore, FileSystemStorage};
use std::sync::Arc;
use tempfile::TempDir;

fn binding(temp_dir: &TempDir, policy: LifecyclePolicy) -> (Arc<FileSystemStorage>, ArtifactLifecycleBinding) {
    let storage = Arc::new(FileSystemStorage::new(temp_dir.path(), "/media/").unwrap());
    save(storage.as_ref(), "photos/cat.png", &png_bytes(64, 32)).unwrap();
    let factory = ArtifactFactory::new(storage.clone(), "CACHE/images");

    let mut builder = SpecRegistry::builder();
    builder
        .register(
            GeneratorDescriptor::new(
                "thumbnails:small",
                Arc::new(Thumbnail {
                    width: 16,
                    height: 16,
                    format: ImageFormat::Png,
                }),
            )
            .with_pre_cache(true),
        )
        .unwrap()
        .register(GeneratorDescriptor::new(
            "thumbnails:jpeg",
            Arc::new(Thumbnail {
                width: 32,
                height: 32,
                format: ImageFormat::Jpeg,
            }),
        ))
        .unwrap();
    let registry = Arc::new(builder.build(factory.clone()));

    let record_type = RecordType::new("photo")
        .with_spec("small", "thumbnails:small")
        .with_spec("jpeg", "thumbnails:jpeg");
    let binding = ArtifactLifecycleBinding::new(
        record_type,
        registry,
        factory,
        memory_orchestrator(),
        policy,
    )
    .unwrap();
    (storage, binding)
}

fn cat() -> SourceRecord {
    SourceRecord::new("cat", "photos/cat.png")
}

#[test]
fn test_access_generates_real_thumbnail() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, binding) = binding(&temp_dir, LifecyclePolicy::default());

    let accessed = binding.access(&cat(), "jpeg").unwrap();
    assert_eq!(accessed.outcome, Some(Outcome::Generated));
    let name = accessed.name.unwrap();
    assert!(name.starts_with("CACHE/images/photos/cat/"));
    assert!(name.ends_with(".jpg"));

    let img = image::load_from_memory(&storage.read(&name).unwrap()).unwrap();
    assert_eq!((img.width(), img.height()), (32, 16));
}

#[test]
fn test_delete_removes_artifacts_and_prunes_directories() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, binding) = binding(&temp_dir, LifecyclePolicy::default());
    binding.access(&cat(), "small").unwrap();
    binding.access(&cat(), "jpeg").unwrap();
    assert_eq!(binding.state(&cat()), ArtifactState::MayBePresent);

    let report = binding.on_deleted(&cat());
    assert_eq!(report.removed.len(), 2);
    assert!(report.delete_errors.is_empty());
    assert!(report.cleanup_error.is_none());

    assert!(!storage.root().join("CACHE/images/photos").exists());
    assert!(storage.root().join("CACHE/images").exists());
    assert!(storage.exists("photos/cat.png").unwrap());
    assert_eq!(binding.state(&cat()), ArtifactState::Absent);
}

#[test]
fn test_foreign_file_blocks_pruning_without_error() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, binding) = binding(&temp_dir, LifecyclePolicy::default());
    let name = binding.access(&cat(), "small").unwrap().name.unwrap();
    save(storage.as_ref(), "CACHE/images/photos/cat/notes.txt", b"keep").unwrap();

    let report = binding.clear_cache(&cat());
    assert_eq!(report.removed, vec![name.clone()]);
    assert!(report.cleanup_error.is_some());
    assert!(!storage.exists(&name).unwrap());
    assert!(storage.exists("CACHE/images/photos/cat/notes.txt").unwrap());
}

#[test]
fn test_optimistic_strategy_pre_caches_on_create() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, binding) = binding(
        &temp_dir,
        LifecyclePolicy {
            strategy: CacheFileStrategy::Optimistic,
            pre_cache_on_create: false,
        },
    );

    let outcomes = binding.on_saved(&cat(), true);
    assert_eq!(outcomes, vec![("small".to_string(), Outcome::Generated)]);

    let small = binding.access(&cat(), "small").unwrap();
    assert!(small.outcome.is_none());
    assert!(storage.exists(small.name.as_deref().unwrap()).unwrap());

    // Not pre-cached and optimistic access never generates
    let jpeg = binding.access(&cat(), "jpeg").unwrap();
    assert!(!storage.exists(jpeg.name.as_deref().unwrap()).unwrap());
}
