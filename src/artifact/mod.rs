//! Artifacts: one concrete generated file per (generator, source record) pair
//!
//! Artifacts are transient handles. They are built per operation by an
//! [`ArtifactFactory`] and never cached in memory; what persists is the file in
//! storage and its marker in the generation cache.

pub mod namer;

pub use namer::Namer;

use crate::error::{GenerationError, StorageError};
use crate::generator::{Generator, GeneratorDescriptor};
use crate::storage::{self, ArtifactStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The owning record as the engine sees it: an identity and the storage name
/// of its source image, if one is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub key: String,
    pub source: Option<String>,
}

impl SourceRecord {
    pub fn new(key: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: Some(source.into()),
        }
    }

    /// A record with no source image attached
    pub fn unbound(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: None,
        }
    }
}

/// Source image location
#[derive(Clone)]
pub struct SourceFile {
    pub name: String,
    pub storage: Arc<dyn ArtifactStore>,
}

#[derive(Clone)]
pub struct Artifact {
    generator_id: String,
    name: Option<String>,
    storage: Arc<dyn ArtifactStore>,
    source: Option<SourceFile>,
    generator: Arc<dyn Generator>,
}

impl Artifact {
    /// An artifact bound to `source`, to be written to `name` in `storage`
    pub fn new(
        generator_id: impl Into<String>,
        name: impl Into<String>,
        storage: Arc<dyn ArtifactStore>,
        source: SourceFile,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            generator_id: generator_id.into(),
            name: Some(name.into()),
            storage,
            source: Some(source),
            generator,
        }
    }

    /// An artifact with no source bound; it has no storage name
    pub fn unbound(
        generator_id: impl Into<String>,
        storage: Arc<dyn ArtifactStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            generator_id: generator_id.into(),
            name: None,
            storage,
            source: None,
            generator,
        }
    }

    pub fn generator_id(&self) -> &str {
        &self.generator_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn storage(&self) -> &Arc<dyn ArtifactStore> {
        &self.storage
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    pub fn source_bound(&self) -> bool {
        self.name.is_some() && self.source.is_some()
    }

    /// Run the generator over the source bytes and write the result to storage
    ///
    /// Fails with [`GenerationError::MissingSource`] when no source is bound.
    pub fn generate(&self) -> Result<(), GenerationError> {
        let (Some(name), Some(source)) = (self.name.as_deref(), self.source.as_ref()) else {
            return Err(GenerationError::MissingSource);
        };

        let bytes = source.storage.read(&source.name)?;
        let output = self
            .generator
            .generate(&bytes)
            .map_err(GenerationError::Generator)?;
        storage::save(self.storage.as_ref(), name, &output)?;
        Ok(())
    }

    pub fn url(&self) -> Option<String> {
        self.name.as_deref().map(|name| self.storage.url(name))
    }

    /// Remove the generated file. Unbound artifacts have nothing to remove.
    pub fn delete(&self) -> Result<(), StorageError> {
        match self.name.as_deref() {
            Some(name) => self.storage.delete(name),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("generator_id", &self.generator_id)
            .field("name", &self.name)
            .field("source", &self.source.as_ref().map(|s| s.name.as_str()))
            .finish_non_exhaustive()
    }
}

/// Builds artifacts from (descriptor, record) pairs.
#[derive(Clone)]
pub struct ArtifactFactory {
    storage: Arc<dyn ArtifactStore>,
    cache_dir: String,
    namer: Namer,
}

impl ArtifactFactory {
    /// Sources are read from the same storage artifacts are written to
    pub fn new(storage: Arc<dyn ArtifactStore>, cache_dir: impl Into<String>) -> Self {
        Self {
            storage,
            cache_dir: cache_dir.into(),
            namer: Namer::default(),
        }
    }

    pub fn with_namer(mut self, namer: Namer) -> Self {
        self.namer = namer;
        self
    }

    pub fn storage(&self) -> &Arc<dyn ArtifactStore> {
        &self.storage
    }

    pub fn cache_dir(&self) -> &str {
        &self.cache_dir
    }

    pub fn namer(&self) -> Namer {
        self.namer
    }

    pub fn build(&self, descriptor: &GeneratorDescriptor, record: &SourceRecord) -> Artifact {
        let generator = Arc::clone(descriptor.generator());
        match record.source.as_deref() {
            Some(source_name) if !source_name.is_empty() => {
                let name = self.namer.name(
                    &self.cache_dir,
                    descriptor.id(),
                    source_name,
                    generator.extension(),
                );
                let source = SourceFile {
                    name: source_name.to_string(),
                    storage: Arc::clone(&self.storage),
                };
                Artifact::new(
                    descriptor.id(),
                    name,
                    Arc::clone(&self.storage),
                    source,
                    generator,
                )
            }
            _ => Artifact::unbound(descriptor.id(), Arc::clone(&self.storage), generator),
        }
    }
}
