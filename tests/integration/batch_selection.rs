//! End-to-end selection and per-artifact isolation of batch sweeps

use super::test_utils::{memory_orchestrator, CountingGenerator, PoisonGenerator, World};
use cachekit::artifact::SourceRecord;
use cachekit::batch::BatchRunner;
use cachekit::error::{PatternError, StorageError};
use cachekit::generator::{Generator, GeneratorDescriptor};
use cachekit::orchestrator::{FailureReason, Outcome};
use cachekit::registry::{RecordCatalog, SpecRegistry};
use std::sync::Arc;

fn three_generators(world: &World) -> (Arc<CountingGenerator>, BatchRunner) {
    let counting = Arc::new(CountingGenerator::default());
    let generators: Vec<(&str, Arc<dyn Generator>)> = vec![
        ("thumb:small", counting.clone()),
        ("thumb:large", counting.clone()),
        ("watermark:a", counting.clone()),
    ];
    let registry = world.registry(generators);
    (counting, BatchRunner::new(registry, memory_orchestrator()))
}

#[test]
fn test_segment_wildcard_selects_one_family() {
    let world = World::with_sources(2);
    let (counting, runner) = three_generators(&world);

    let report = runner.run(&["thumb:*"]).unwrap();
    let ids: Vec<&str> = report.generators.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["thumb:small", "thumb:large"]);
    assert_eq!(report.summary.ids_considered, 2);
    assert_eq!(report.summary.generated, 4);
    assert_eq!(counting.calls(), 4);
}

#[test]
fn test_no_patterns_selects_everything() {
    let world = World::with_sources(1);
    let (_counting, runner) = three_generators(&world);

    let report = runner.run::<&str>(&[]).unwrap();
    assert_eq!(report.summary.ids_considered, 3);
    assert_eq!(report.summary.artifacts, 3);
}

#[test]
fn test_unmatched_pattern_considers_nothing() {
    let world = World::with_sources(3);
    let (counting, runner) = three_generators(&world);

    let report = runner.run(&["nope"]).unwrap();
    assert_eq!(report.summary.ids_considered, 0);
    assert!(report.generators.is_empty());
    assert_eq!(counting.calls(), 0);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_patterns_are_or_combined() {
    let world = World::with_sources(1);
    let (_counting, runner) = three_generators(&world);
    assert_eq!(
        runner.select_ids(&["watermark", "thumb:large"]).unwrap(),
        vec!["thumb:large", "watermark:a"]
    );
}

#[test]
fn test_malformed_pattern_aborts_before_generation() {
    let world = World::with_sources(2);
    let (counting, runner) = three_generators(&world);

    let err = runner.run(&["thumb:*", "thumb:***"]).unwrap_err();
    assert!(matches!(err, PatternError::RepeatedWildcard { count: 3, .. }));
    assert_eq!(counting.calls(), 0);
    assert_eq!(world.storage.total_writes(), 0);
}

#[test]
fn test_one_failure_among_ten_is_isolated() {
    let world = World::with_sources(10);
    world.storage.insert("photos/04.jpg", "poison");
    let generators: Vec<(&str, Arc<dyn Generator>)> = vec![(
        "thumb:small",
        Arc::new(PoisonGenerator {
            poison: b"poison".to_vec(),
        }),
    )];
    let runner = BatchRunner::new(world.registry(generators), memory_orchestrator());

    let report = runner.run::<&str>(&[]).unwrap();
    assert_eq!(report.summary.artifacts, 10);
    assert_eq!(report.summary.generated, 9);
    assert_eq!(report.summary.failed, 1);
    assert!(report.has_generation_errors());
    assert_eq!(report.exit_code(), 1);

    let failed: Vec<_> = report
        .entries()
        .filter(|(_, a)| a.outcome.is_generation_error())
        .collect();
    assert_eq!(failed.len(), 1);
    match &failed[0].1.outcome {
        Outcome::Failed {
            reason: FailureReason::GenerationError,
            detail: Some(detail),
        } => assert!(detail.contains("refusing poisoned source")),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_missing_sources_do_not_change_exit_code() {
    let world = World::with_sources(2);
    world.catalog.insert(SourceRecord::unbound("no-image"));
    let (_counting, runner) = three_generators(&world);

    let report = runner.run(&["thumb:small"]).unwrap();
    assert_eq!(report.summary.missing_source, 1);
    assert_eq!(report.summary.generated, 2);
    assert_eq!(report.exit_code(), 0);
}

struct FailingCatalog;

impl RecordCatalog for FailingCatalog {
    fn records(&self) -> Result<Vec<SourceRecord>, StorageError> {
        Err(StorageError::Backend("database is locked".to_string()))
    }
}

#[test]
fn test_catalog_failure_is_reported_per_generator() {
    let world = World::with_sources(2);
    let counting: Arc<dyn Generator> = Arc::new(CountingGenerator::default());

    let mut builder = SpecRegistry::builder();
    builder
        .register(GeneratorDescriptor::new("a", counting.clone()))
        .unwrap()
        .register(GeneratorDescriptor::new("b", counting))
        .unwrap();
    builder.register_catalog("a", Arc::new(FailingCatalog)).unwrap();
    builder.register_catalog("b", world.catalog.clone()).unwrap();
    let runner = BatchRunner::new(
        Arc::new(builder.build(world.factory.clone())),
        memory_orchestrator(),
    );

    let report = runner.run::<&str>(&[]).unwrap();
    assert_eq!(report.generators[0].artifacts.len(), 1);
    assert!(report.generators[0].artifacts[0].name.is_none());
    assert!(report.generators[0].artifacts[0].outcome.is_generation_error());
    assert_eq!(report.generators[1].artifacts.len(), 2);
    assert_eq!(report.summary.generated, 2);
}

#[test]
fn test_repeated_runs_produce_identical_ordering() {
    let world = World::with_sources(4);
    let (_counting, runner) = three_generators(&world);

    let first: Vec<Option<String>> = runner
        .run::<&str>(&[])
        .unwrap()
        .entries()
        .map(|(_, a)| a.name.clone())
        .collect();
    let second = runner.run::<&str>(&[]).unwrap();
    let names: Vec<Option<String>> = second.entries().map(|(_, a)| a.name.clone()).collect();
    assert_eq!(first, names);
    assert_eq!(second.summary.skipped, 12);
}
