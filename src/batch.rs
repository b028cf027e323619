//! Batch generation sweep
//!
//! Selects registered generator ids by pattern and ensures every candidate
//! artifact of each selected id is generated. One artifact's failure never stops
//! the sweep; only a malformed pattern aborts it, and that happens before any
//! generation work.

use crate::error::PatternError;
use crate::orchestrator::{GenerationOrchestrator, Outcome};
use crate::pattern::{compile_all, PatternSet};
use crate::registry::SpecRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Progress notifications emitted while a sweep runs
#[derive(Debug, Clone, Copy)]
pub enum BatchEvent<'a> {
    GeneratorStarted { id: &'a str },
    Artifact { id: &'a str, report: &'a ArtifactReport },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReport {
    /// Storage name; absent for unbound artifacts and catalog failures
    pub name: Option<String>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorReport {
    pub id: String,
    pub artifacts: Vec<ArtifactReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub ids_considered: usize,
    pub artifacts: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub missing_source: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &Outcome) {
        self.artifacts += 1;
        if outcome.is_generated() {
            self.generated += 1;
        } else if outcome.is_skipped() {
            self.skipped += 1;
        } else if outcome.is_missing_source() {
            self.missing_source += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub generators: Vec<GeneratorReport>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// True when any artifact failed for a reason other than a missing source
    pub fn has_generation_errors(&self) -> bool {
        self.summary.failed > 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_generation_errors() {
            1
        } else {
            0
        }
    }

    /// Every (generator id, artifact report) pair in processing order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ArtifactReport)> {
        self.generators
            .iter()
            .flat_map(|g| g.artifacts.iter().map(move |a| (g.id.as_str(), a)))
    }
}

pub struct BatchRunner {
    registry: Arc<SpecRegistry>,
    orchestrator: Arc<GenerationOrchestrator>,
}

impl BatchRunner {
    pub fn new(registry: Arc<SpecRegistry>, orchestrator: Arc<GenerationOrchestrator>) -> Self {
        Self {
            registry,
            orchestrator,
        }
    }

    /// Registered ids selected by `patterns`, in registration order.
    ///
    /// No patterns selects every id; otherwise an id is kept when any pattern
    /// matches it.
    pub fn select_ids<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Vec<String>, PatternError> {
        let set = compile_all(patterns)?;
        Ok(self.selected(&set))
    }

    pub fn run<S: AsRef<str>>(&self, patterns: &[S]) -> Result<BatchReport, PatternError> {
        self.run_with_progress(patterns, |_| {})
    }

    pub fn run_with_progress<S, F>(
        &self,
        patterns: &[S],
        mut on_event: F,
    ) -> Result<BatchReport, PatternError>
    where
        S: AsRef<str>,
        F: FnMut(&BatchEvent<'_>),
    {
        let set = compile_all(patterns)?;
        let ids = self.selected(&set);
        info!(
            patterns = set.len(),
            generators = ids.len(),
            "Starting generation sweep"
        );

        let mut report = BatchReport::default();
        report.summary.ids_considered = ids.len();

        for id in ids {
            on_event(&BatchEvent::GeneratorStarted { id: &id });
            let mut artifacts = Vec::new();

            for item in self.registry.get_artifacts(&id).iter() {
                let entry = match item {
                    Ok(artifact) => match artifact.name() {
                        Some(name) => ArtifactReport {
                            name: Some(name.to_string()),
                            outcome: self.orchestrator.ensure_generated(&artifact),
                        },
                        None => ArtifactReport {
                            name: None,
                            outcome: Outcome::missing_source(),
                        },
                    },
                    Err(e) => ArtifactReport {
                        name: None,
                        outcome: Outcome::generation_error(format!("Failed to list records: {}", e)),
                    },
                };
                report.summary.record(&entry.outcome);
                on_event(&BatchEvent::Artifact {
                    id: &id,
                    report: &entry,
                });
                artifacts.push(entry);
            }

            report.generators.push(GeneratorReport { id, artifacts });
        }

        let summary = &report.summary;
        info!(
            ids_considered = summary.ids_considered,
            artifacts = summary.artifacts,
            generated = summary.generated,
            skipped = summary.skipped,
            failed = summary.failed,
            missing_source = summary.missing_source,
            "Generation sweep finished"
        );
        Ok(report)
    }

    fn selected(&self, set: &PatternSet) -> Vec<String> {
        self.registry
            .ids()
            .filter(|id| set.matches(id))
            .map(str::to_string)
            .collect()
    }
}
