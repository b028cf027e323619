//! Generation orchestration
//!
//! Decides for one artifact whether generation is needed, using the generation
//! cache first and storage second, and runs the generator only when neither
//! confirms the artifact is present. Every failure mode becomes an [`Outcome`];
//! nothing propagates to the caller.

use crate::artifact::Artifact;
use crate::cache::{CacheKeyBuilder, GenerationCache};
use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    CacheHit,
    StorageHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    MissingSource,
    GenerationError,
}

/// Result of one `ensure_generated` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    Skipped {
        reason: SkipReason,
    },
    Generated,
    Failed {
        reason: FailureReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl Outcome {
    pub fn missing_source() -> Self {
        Outcome::Failed {
            reason: FailureReason::MissingSource,
            detail: None,
        }
    }

    pub fn generation_error(detail: impl fmt::Display) -> Self {
        Outcome::Failed {
            reason: FailureReason::GenerationError,
            detail: Some(detail.to_string()),
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Outcome::Generated)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped { .. })
    }

    pub fn is_missing_source(&self) -> bool {
        matches!(
            self,
            Outcome::Failed {
                reason: FailureReason::MissingSource,
                ..
            }
        )
    }

    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            Outcome::Failed {
                reason: FailureReason::GenerationError,
                ..
            }
        )
    }

    /// Short label for line-oriented output
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Skipped {
                reason: SkipReason::CacheHit,
            } => "cached",
            Outcome::Skipped {
                reason: SkipReason::StorageHit,
            } => "exists",
            Outcome::Generated => "generated",
            Outcome::Failed {
                reason: FailureReason::MissingSource,
                ..
            } => "missing source",
            Outcome::Failed {
                reason: FailureReason::GenerationError,
                ..
            } => "FAILED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed {
                detail: Some(detail),
                ..
            } => write!(f, "{}: {}", self.tag(), detail),
            _ => f.write_str(self.tag()),
        }
    }
}

pub struct GenerationOrchestrator {
    cache: Arc<dyn GenerationCache>,
    keys: CacheKeyBuilder,
    ttl: Option<Duration>,
}

impl GenerationOrchestrator {
    pub fn new(cache: Arc<dyn GenerationCache>, keys: CacheKeyBuilder) -> Self {
        Self {
            cache,
            keys,
            ttl: None,
        }
    }

    /// Expiry for cache markers; `None` keeps them until evicted
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn keys(&self) -> &CacheKeyBuilder {
        &self.keys
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Cache key for a named artifact
    pub fn cache_key(&self, artifact: &Artifact) -> Option<String> {
        artifact.name().map(|name| self.keys.key_for(name))
    }

    /// Make sure `artifact` exists in storage, generating it at most once.
    pub fn ensure_generated(&self, artifact: &Artifact) -> Outcome {
        let Some(name) = artifact.name() else {
            debug!(generator_id = artifact.generator_id(), "Artifact has no source");
            return Outcome::missing_source();
        };
        let key = self.keys.key_for(name);

        match self.cache.get(&key) {
            Ok(Some(true)) => {
                debug!(name, key = key.as_str(), "Generation cache hit");
                return Outcome::Skipped {
                    reason: SkipReason::CacheHit,
                };
            }
            Ok(_) => debug!(name, key = key.as_str(), "Generation cache miss"),
            Err(e) => return Outcome::generation_error(e),
        }

        match artifact.storage().exists(name) {
            Ok(true) => {
                debug!(name, "Artifact already in storage");
                self.mark_present(&key, name);
                return Outcome::Skipped {
                    reason: SkipReason::StorageHit,
                };
            }
            Ok(false) => {}
            Err(e) => return Outcome::generation_error(e),
        }

        match artifact.generate() {
            Ok(()) => {
                info!(
                    generator_id = artifact.generator_id(),
                    name, "Generated artifact"
                );
                self.mark_present(&key, name);
                Outcome::Generated
            }
            Err(GenerationError::MissingSource) => Outcome::missing_source(),
            Err(e) => {
                warn!(
                    generator_id = artifact.generator_id(),
                    name,
                    error = %e,
                    "Artifact generation failed"
                );
                Outcome::generation_error(e)
            }
        }
    }

    /// Drop the presence marker so the next check consults storage.
    ///
    /// Writes a `false` marker, which lookups treat as a miss.
    pub fn forget(&self, artifact: &Artifact) {
        let Some(key) = self.cache_key(artifact) else {
            return;
        };
        if let Err(e) = self.cache.set(&key, false, self.ttl) {
            warn!(key = key.as_str(), error = %e, "Failed to clear generation marker");
        }
    }

    fn mark_present(&self, key: &str, name: &str) {
        if let Err(e) = self.cache.set(key, true, self.ttl) {
            warn!(key, name, error = %e, "Failed to record generation marker");
        }
    }
}
