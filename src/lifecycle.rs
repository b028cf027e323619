//! Record lifecycle binding
//!
//! Connects a record type's named accessors to registered generators and reacts
//! to the persistence layer's save and delete notifications. The persistence
//! layer calls [`ArtifactLifecycleBinding::on_saved`] and
//! [`ArtifactLifecycleBinding::on_deleted`] after its own commit.
//!
//! Replacing a record's source image does not invalidate its existing
//! artifacts; callers that swap sources should call `clear_cache` first.

use crate::artifact::{Artifact, ArtifactFactory, SourceRecord};
use crate::error::LifecycleError;
use crate::orchestrator::{GenerationOrchestrator, Outcome};
use crate::registry::SpecRegistry;
use crate::storage::parent_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Accessor name → generator id mapping for one kind of record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    name: String,
    specs: Vec<(String, String)>,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            specs: Vec::new(),
        }
    }

    /// Expose the artifact of `generator_id` under `accessor`. A repeated
    /// accessor replaces the earlier mapping.
    pub fn with_spec(mut self, accessor: impl Into<String>, generator_id: impl Into<String>) -> Self {
        let accessor = accessor.into();
        let generator_id = generator_id.into();
        match self.specs.iter_mut().find(|(a, _)| *a == accessor) {
            Some(entry) => entry.1 = generator_id,
            None => self.specs.push((accessor, generator_id)),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generator_id(&self, accessor: &str) -> Option<&str> {
        self.specs
            .iter()
            .find(|(a, _)| a == accessor)
            .map(|(_, id)| id.as_str())
    }

    /// (accessor, generator id) pairs in declaration order
    pub fn specs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.specs.iter().map(|(a, id)| (a.as_str(), id.as_str()))
    }
}

/// When artifacts are produced for accessed records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheFileStrategy {
    /// Ensure the artifact exists every time its URL is requested
    #[default]
    JustInTime,
    /// Hand out URLs without checking; artifacts are produced when records are created
    Optimistic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    pub strategy: CacheFileStrategy,
    /// Eagerly generate `pre_cache` artifacts when a record is created
    pub pre_cache_on_create: bool,
}

impl LifecyclePolicy {
    pub fn pre_caches(&self) -> bool {
        self.pre_cache_on_create || self.strategy == CacheFileStrategy::Optimistic
    }
}

/// Result of a create-on-access request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessedArtifact {
    pub name: Option<String>,
    pub url: Option<String>,
    /// `None` when the strategy skipped the existence check
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub removed: Vec<String>,
    /// (storage name, error) for artifacts that could not be deleted
    pub delete_errors: Vec<(String, String)>,
    /// First directory pruning failure, kept for reporting only
    pub cleanup_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    Absent,
    MayBePresent,
}

pub struct ArtifactLifecycleBinding {
    record_type: RecordType,
    registry: Arc<SpecRegistry>,
    factory: ArtifactFactory,
    orchestrator: Arc<GenerationOrchestrator>,
    policy: LifecyclePolicy,
}

impl ArtifactLifecycleBinding {
    /// Bind `record_type`; every mapped generator id must be registered.
    pub fn new(
        record_type: RecordType,
        registry: Arc<SpecRegistry>,
        factory: ArtifactFactory,
        orchestrator: Arc<GenerationOrchestrator>,
        policy: LifecyclePolicy,
    ) -> Result<Self, LifecycleError> {
        for (_, generator_id) in record_type.specs() {
            if !registry.contains(generator_id) {
                return Err(LifecycleError::UnknownGenerator {
                    record_type: record_type.name().to_string(),
                    generator_id: generator_id.to_string(),
                });
            }
        }
        debug!(
            record_type = record_type.name(),
            accessors = record_type.specs.len(),
            "Bound record type"
        );
        Ok(Self {
            record_type,
            registry,
            factory,
            orchestrator,
            policy,
        })
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    /// The artifact behind `accessor` for `record`, without generating it
    pub fn artifact(&self, record: &SourceRecord, accessor: &str) -> Result<Artifact, LifecycleError> {
        let generator_id = self.record_type.generator_id(accessor).ok_or_else(|| {
            LifecycleError::UnknownAccessor {
                record_type: self.record_type.name().to_string(),
                accessor: accessor.to_string(),
            }
        })?;
        let descriptor = self.registry.descriptor(generator_id).ok_or_else(|| {
            LifecycleError::UnknownGenerator {
                record_type: self.record_type.name().to_string(),
                generator_id: generator_id.to_string(),
            }
        })?;
        Ok(self.factory.build(descriptor, record))
    }

    /// Create-on-access: resolve the artifact and apply the cache-file strategy
    pub fn access(&self, record: &SourceRecord, accessor: &str) -> Result<AccessedArtifact, LifecycleError> {
        let artifact = self.artifact(record, accessor)?;
        let outcome = match self.policy.strategy {
            CacheFileStrategy::JustInTime => Some(self.orchestrator.ensure_generated(&artifact)),
            CacheFileStrategy::Optimistic => None,
        };
        Ok(AccessedArtifact {
            name: artifact.name().map(str::to_string),
            url: artifact.url(),
            outcome,
        })
    }

    /// Save notification. Only creations trigger work, and only when the policy
    /// pre-caches; updates never regenerate.
    pub fn on_saved(&self, record: &SourceRecord, created: bool) -> Vec<(String, Outcome)> {
        if !created || !self.policy.pre_caches() {
            return Vec::new();
        }

        let mut outcomes = Vec::new();
        for (accessor, generator_id) in self.record_type.specs() {
            let Some(descriptor) = self.registry.descriptor(generator_id) else {
                continue;
            };
            if !descriptor.pre_cache() {
                continue;
            }
            let artifact = self.factory.build(descriptor, record);
            let outcome = self.orchestrator.ensure_generated(&artifact);
            debug!(record = record.key.as_str(), accessor, outcome = %outcome, "Pre-cached artifact");
            outcomes.push((accessor.to_string(), outcome));
        }
        if !outcomes.is_empty() {
            info!(
                record_type = self.record_type.name(),
                record = record.key.as_str(),
                artifacts = outcomes.len(),
                "Pre-cached artifacts for new record"
            );
        }
        outcomes
    }

    /// Delete notification; see [`ArtifactLifecycleBinding::clear_cache`]
    pub fn on_deleted(&self, record: &SourceRecord) -> DeletionReport {
        self.clear_cache(record)
    }

    /// Delete every materialized artifact of `record`, then prune emptied cache
    /// directories. Failures are collected in the report, never returned.
    pub fn clear_cache(&self, record: &SourceRecord) -> DeletionReport {
        let mut report = DeletionReport::default();

        for artifact in self.artifacts_of(record) {
            let Some(name) = artifact.name() else {
                continue;
            };
            let present = match artifact.storage().exists(name) {
                Ok(present) => present,
                Err(e) => {
                    report.delete_errors.push((name.to_string(), e.to_string()));
                    continue;
                }
            };
            self.orchestrator.forget(&artifact);
            if !present {
                continue;
            }
            match artifact.delete() {
                Ok(()) => report.removed.push(name.to_string()),
                Err(e) => {
                    warn!(name, error = %e, "Failed to delete artifact");
                    report.delete_errors.push((name.to_string(), e.to_string()));
                }
            }
        }

        let storage = self.factory.storage();
        let cache_dir = self.factory.cache_dir();
        let mut pruned = BTreeSet::new();
        for name in &report.removed {
            if !parent_dir(name).is_some_and(|dir| pruned.insert(dir.to_string())) {
                continue;
            }
            if let Err(e) = storage.remove_empty_dirs(name, cache_dir) {
                debug!(name = name.as_str(), error = %e, "Cache directory left in place");
                if report.cleanup_error.is_none() {
                    report.cleanup_error = Some(format!(
                        "Failed to prune cache directories for record {}: {}",
                        record.key, e
                    ));
                }
            }
        }

        info!(
            record_type = self.record_type.name(),
            record = record.key.as_str(),
            removed = report.removed.len(),
            errors = report.delete_errors.len(),
            "Cleared cached artifacts"
        );
        report
    }

    /// `MayBePresent` when storage holds any of the record's artifacts
    pub fn state(&self, record: &SourceRecord) -> ArtifactState {
        let present = self.artifacts_of(record).iter().any(|artifact| {
            artifact
                .name()
                .is_some_and(|name| artifact.storage().exists(name).unwrap_or(true))
        });
        if present {
            ArtifactState::MayBePresent
        } else {
            ArtifactState::Absent
        }
    }

    fn artifacts_of(&self, record: &SourceRecord) -> Vec<Artifact> {
        self.record_type
            .specs()
            .filter_map(|(_, id)| self.registry.descriptor(id))
            .map(|descriptor| self.factory.build(descriptor, record))
            .collect()
    }
}
