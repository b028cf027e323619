//! Generators and their registered descriptors
//!
//! A generator turns source bytes into rendition bytes. The engine never looks
//! inside: it only needs `generate` and, optionally, the file extension the
//! output should carry.

pub mod builtin;

pub use builtin::{GeneratorKind, ImageFormat, Passthrough, Resize, Thumbnail};

use crate::error::RegistryError;
use crate::pattern::SEPARATOR;
use std::fmt;
use std::sync::Arc;

/// A named transformation producing one kind of derived artifact.
pub trait Generator: Send + Sync {
    fn generate(&self, source: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Extension (with leading dot) for generated files. `None` keeps the
    /// source's extension.
    fn extension(&self) -> Option<&str> {
        None
    }
}

impl<F> Generator for F
where
    F: Fn(&[u8]) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    fn generate(&self, source: &[u8]) -> anyhow::Result<Vec<u8>> {
        self(source)
    }
}

/// Immutable registration record for one generator id.
#[derive(Clone)]
pub struct GeneratorDescriptor {
    id: String,
    pre_cache: bool,
    generator: Arc<dyn Generator>,
}

impl GeneratorDescriptor {
    pub fn new(id: impl Into<String>, generator: Arc<dyn Generator>) -> Self {
        Self {
            id: id.into(),
            pre_cache: false,
            generator,
        }
    }

    /// Mark the generator for eager generation when an owning record is created.
    pub fn with_pre_cache(mut self, pre_cache: bool) -> Self {
        self.pre_cache = pre_cache;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pre_cache(&self) -> bool {
        self.pre_cache
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }
}

impl fmt::Debug for GeneratorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorDescriptor")
            .field("id", &self.id)
            .field("pre_cache", &self.pre_cache)
            .finish_non_exhaustive()
    }
}

/// Check that `id` is a well-formed colon-delimited generator id.
pub fn validate_id(id: &str) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("id cannot be empty"));
    }
    if id.split(SEPARATOR).any(str::is_empty) {
        return Err(invalid("segments cannot be empty"));
    }
    if id.contains('*') {
        return Err(invalid("'*' is reserved for patterns"));
    }
    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("whitespace and control characters are not allowed"));
    }
    Ok(())
}
