//! Spec registry
//!
//! Maps generator ids to their descriptors and to the record catalogs that
//! enumerate candidate artifacts. Populated once through
//! [`SpecRegistryBuilder`] at startup and read-only afterwards.

pub mod catalog;
pub mod global;

pub use catalog::{DirectoryCatalog, MemoryCatalog, RecordCatalog};

use crate::artifact::{Artifact, ArtifactFactory};
use crate::error::{RegistryError, StorageError};
use crate::generator::{validate_id, GeneratorDescriptor};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Single-writer registry population.
#[derive(Default)]
pub struct SpecRegistryBuilder {
    order: Vec<String>,
    descriptors: HashMap<String, Arc<GeneratorDescriptor>>,
    catalogs: HashMap<String, Vec<Arc<dyn RecordCatalog>>>,
}

impl SpecRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator. Ids must be well-formed and unique.
    pub fn register(&mut self, descriptor: GeneratorDescriptor) -> Result<&mut Self, RegistryError> {
        validate_id(descriptor.id())?;
        if self.descriptors.contains_key(descriptor.id()) {
            return Err(RegistryError::DuplicateId(descriptor.id().to_string()));
        }
        debug!(generator_id = descriptor.id(), pre_cache = descriptor.pre_cache(), "Registered generator");
        self.order.push(descriptor.id().to_string());
        self.descriptors
            .insert(descriptor.id().to_string(), Arc::new(descriptor));
        Ok(self)
    }

    /// Bind a record catalog to a registered generator id
    pub fn register_catalog(
        &mut self,
        generator_id: &str,
        catalog: Arc<dyn RecordCatalog>,
    ) -> Result<&mut Self, RegistryError> {
        if !self.descriptors.contains_key(generator_id) {
            return Err(RegistryError::UnknownId(generator_id.to_string()));
        }
        self.catalogs
            .entry(generator_id.to_string())
            .or_default()
            .push(catalog);
        Ok(self)
    }

    /// Bind one catalog to every generator registered so far
    pub fn register_catalog_for_all(&mut self, catalog: Arc<dyn RecordCatalog>) -> &mut Self {
        for id in &self.order {
            self.catalogs
                .entry(id.clone())
                .or_default()
                .push(Arc::clone(&catalog));
        }
        self
    }

    pub fn build(self, factory: ArtifactFactory) -> SpecRegistry {
        SpecRegistry {
            order: self.order,
            descriptors: self.descriptors,
            catalogs: self.catalogs,
            factory,
        }
    }
}

/// Read-only table of generators and their candidate artifacts
pub struct SpecRegistry {
    order: Vec<String>,
    descriptors: HashMap<String, Arc<GeneratorDescriptor>>,
    catalogs: HashMap<String, Vec<Arc<dyn RecordCatalog>>>,
    factory: ArtifactFactory,
}

impl SpecRegistry {
    pub fn builder() -> SpecRegistryBuilder {
        SpecRegistryBuilder::new()
    }

    /// Every registered id
    pub fn get_ids(&self) -> BTreeSet<String> {
        self.order.iter().cloned().collect()
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn contains(&self, generator_id: &str) -> bool {
        self.descriptors.contains_key(generator_id)
    }

    pub fn descriptor(&self, generator_id: &str) -> Option<&Arc<GeneratorDescriptor>> {
        self.descriptors.get(generator_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn factory(&self) -> &ArtifactFactory {
        &self.factory
    }

    /// Candidate artifacts for `generator_id`. Unknown ids yield an empty query.
    pub fn get_artifacts(&self, generator_id: &str) -> ArtifactQuery {
        ArtifactQuery {
            descriptor: self.descriptors.get(generator_id).cloned(),
            catalogs: self
                .catalogs
                .get(generator_id)
                .cloned()
                .unwrap_or_default(),
            factory: self.factory.clone(),
        }
    }
}

/// Restartable, lazy sequence of artifacts for one generator.
///
/// Every call to [`ArtifactQuery::iter`] re-queries the catalogs, and each
/// catalog is only queried once iteration reaches it.
#[derive(Clone)]
pub struct ArtifactQuery {
    descriptor: Option<Arc<GeneratorDescriptor>>,
    catalogs: Vec<Arc<dyn RecordCatalog>>,
    factory: ArtifactFactory,
}

impl ArtifactQuery {
    pub fn iter(&self) -> impl Iterator<Item = Result<Artifact, StorageError>> + '_ {
        self.catalogs
            .iter()
            .flat_map(move |catalog| self.catalog_artifacts(catalog.as_ref()))
    }

    fn catalog_artifacts<'a>(
        &'a self,
        catalog: &'a dyn RecordCatalog,
    ) -> Box<dyn Iterator<Item = Result<Artifact, StorageError>> + 'a> {
        let Some(descriptor) = self.descriptor.as_deref() else {
            return Box::new(std::iter::empty());
        };
        match catalog.records() {
            Ok(records) => Box::new(
                records
                    .into_iter()
                    .map(move |record| Ok(self.factory.build(descriptor, &record))),
            ),
            Err(err) => Box::new(std::iter::once(Err(err))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.descriptor.is_none() || self.catalogs.is_empty()
    }
}
