//! Idempotence and reconciliation of the generation protocol

use super::test_utils::{memory_orchestrator, orchestrator, CountingGenerator, World};
use cachekit::artifact::SourceRecord;
use cachekit::cache::{DummyGenerationCache, SledGenerationCache};
use cachekit::generator::GeneratorDescriptor;
use cachekit::orchestrator::{Outcome, SkipReason};
use cachekit::storage::ArtifactStore;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_repeated_calls_write_once() {
    let world = World::with_sources(1);
    let generator = Arc::new(CountingGenerator::default());
    let descriptor = GeneratorDescriptor::new("thumb:small", generator.clone());
    let artifact = world
        .factory
        .build(&descriptor, &SourceRecord::new("0", "photos/00.jpg"));
    let orchestrator = memory_orchestrator();

    assert_eq!(orchestrator.ensure_generated(&artifact), Outcome::Generated);
    for _ in 0..5 {
        assert_eq!(
            orchestrator.ensure_generated(&artifact),
            Outcome::Skipped {
                reason: SkipReason::CacheHit
            }
        );
    }
    assert_eq!(generator.calls(), 1);
    assert_eq!(world.storage.write_count(artifact.name().unwrap()), 1);
}

#[test]
fn test_present_artifact_with_empty_cache_is_not_regenerated() {
    let world = World::with_sources(1);
    let generator = Arc::new(CountingGenerator::default());
    let descriptor = GeneratorDescriptor::new("thumb:small", generator.clone());
    let artifact = world
        .factory
        .build(&descriptor, &SourceRecord::new("0", "photos/00.jpg"));
    world.storage.insert(artifact.name().unwrap(), "rendered earlier");

    let outcome = memory_orchestrator().ensure_generated(&artifact);
    assert_eq!(
        outcome,
        Outcome::Skipped {
            reason: SkipReason::StorageHit
        }
    );
    assert_eq!(generator.calls(), 0);
    assert_eq!(world.storage.total_writes(), 0);
}

#[test]
fn test_dummy_cache_always_consults_storage() {
    let world = World::with_sources(1);
    let generator = Arc::new(CountingGenerator::default());
    let descriptor = GeneratorDescriptor::new("thumb:small", generator.clone());
    let artifact = world
        .factory
        .build(&descriptor, &SourceRecord::new("0", "photos/00.jpg"));
    let orchestrator = orchestrator(Arc::new(DummyGenerationCache));

    assert_eq!(orchestrator.ensure_generated(&artifact), Outcome::Generated);
    assert_eq!(
        orchestrator.ensure_generated(&artifact),
        Outcome::Skipped {
            reason: SkipReason::StorageHit
        }
    );
    assert_eq!(generator.calls(), 1);
}

#[test]
fn test_missing_source_never_reaches_generator() {
    let world = World::with_sources(0);
    let generator = Arc::new(CountingGenerator::default());
    let descriptor = GeneratorDescriptor::new("thumb:small", generator.clone());
    let artifact = world
        .factory
        .build(&descriptor, &SourceRecord::unbound("orphan"));

    let orchestrator = memory_orchestrator();
    for _ in 0..3 {
        assert!(orchestrator.ensure_generated(&artifact).is_missing_source());
    }
    assert_eq!(generator.calls(), 0);
    assert_eq!(world.storage.total_writes(), 0);
}

#[test]
fn test_sled_cache_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let cache_path = temp_dir.path().join("generation-cache");
    let world = World::with_sources(1);
    let generator = Arc::new(CountingGenerator::default());
    let descriptor = GeneratorDescriptor::new("thumb:small", generator.clone());
    let artifact = world
        .factory
        .build(&descriptor, &SourceRecord::new("0", "photos/00.jpg"));

    {
        let cache = SledGenerationCache::new(&cache_path).unwrap();
        let orchestrator = orchestrator(Arc::new(cache));
        assert_eq!(orchestrator.ensure_generated(&artifact), Outcome::Generated);
    }

    // A fresh process would see the marker and never touch storage
    world.storage.set_unavailable(true);
    let cache = SledGenerationCache::new(&cache_path).unwrap();
    let outcome = orchestrator(Arc::new(cache)).ensure_generated(&artifact);
    assert_eq!(
        outcome,
        Outcome::Skipped {
            reason: SkipReason::CacheHit
        }
    );
    world.storage.set_unavailable(false);
    assert!(world.storage.exists(artifact.name().unwrap()).unwrap());
    assert_eq!(generator.calls(), 1);
}
