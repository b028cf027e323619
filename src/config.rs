//! Configuration System
//!
//! Layered configuration for the cache backend, artifact storage, lifecycle
//! policy and configured generator specs. Relative paths resolve against the
//! workspace root.

use crate::artifact::{ArtifactFactory, Namer};
use crate::cache::{
    CacheKeyBuilder, DummyGenerationCache, GenerationCache, MemoryGenerationCache,
    SledGenerationCache,
};
use crate::error::ApiError;
use crate::generator::{
    validate_id, Generator, GeneratorDescriptor, GeneratorKind, ImageFormat, Passthrough, Resize,
    Thumbnail,
};
use crate::lifecycle::{CacheFileStrategy, LifecyclePolicy};
use crate::logging::LoggingConfig;
use crate::orchestrator::GenerationOrchestrator;
use crate::storage::FileSystemStorage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheKitConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Generator specs keyed by id, e.g. `[specs."thumbnails:small"]`
    #[serde(default)]
    pub specs: BTreeMap<String, SpecConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    #[default]
    Sled,
    Dummy,
}

/// Generation cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Marker lifetime in seconds. Bounds how long an artifact removed
    /// outside `clear_cache` keeps being reported as present. `0` or unset
    /// keeps markers indefinitely.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: Option<u64>,

    /// Database directory for the sled backend
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    #[serde(default = "default_true")]
    pub memcached_safe_keys: bool,
}

fn default_prefix() -> String {
    "cachekit:".to_string()
}

fn default_namespace() -> String {
    "generation".to_string()
}

pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

fn default_ttl_secs() -> Option<u64> {
    Some(DEFAULT_TTL_SECS)
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".cachekit/generation-cache")
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            prefix: default_prefix(),
            namespace: default_namespace(),
            ttl_secs: default_ttl_secs(),
            path: default_cache_path(),
            memcached_safe_keys: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    pub fn key_builder(&self) -> CacheKeyBuilder {
        CacheKeyBuilder::new(&self.prefix, &self.namespace)
            .with_memcached_safe(self.memcached_safe_keys)
    }

    /// Open the configured backend
    pub fn open(&self, workspace_root: &Path) -> Result<Arc<dyn GenerationCache>, ApiError> {
        Ok(match self.backend {
            CacheBackend::Memory => Arc::new(MemoryGenerationCache::new()),
            CacheBackend::Dummy => Arc::new(DummyGenerationCache),
            CacheBackend::Sled => {
                Arc::new(SledGenerationCache::new(resolve(workspace_root, &self.path))?)
            }
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.namespace.is_empty() {
            return Err("Cache namespace cannot be empty".to_string());
        }
        if self.backend == CacheBackend::Sled && self.path.as_os_str().is_empty() {
            return Err("Cache path cannot be empty for the sled backend".to_string());
        }
        Ok(())
    }
}

/// Artifact and source storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage root directory
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// Public URL prefix for stored names
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory under the root that holds source images; empty means the root
    #[serde(default)]
    pub source_dir: String,

    /// Directory under the root that receives generated artifacts
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    #[serde(default)]
    pub namer: Namer,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_base_url() -> String {
    "/media/".to_string()
}

fn default_cache_dir() -> String {
    "CACHE/images".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            base_url: default_base_url(),
            source_dir: String::new(),
            cache_dir: default_cache_dir(),
            namer: Namer::default(),
        }
    }
}

impl StorageConfig {
    pub fn root_path(&self, workspace_root: &Path) -> PathBuf {
        resolve(workspace_root, &self.root)
    }

    pub fn open(&self, workspace_root: &Path) -> Result<Arc<FileSystemStorage>, ApiError> {
        Ok(Arc::new(FileSystemStorage::new(
            self.root_path(workspace_root),
            self.base_url.clone(),
        )?))
    }

    pub fn factory(&self, storage: Arc<FileSystemStorage>) -> ArtifactFactory {
        ArtifactFactory::new(storage, self.cache_dir.clone()).with_namer(self.namer)
    }

    fn validate(&self) -> Result<(), String> {
        if self.root.as_os_str().is_empty() {
            return Err("Storage root cannot be empty".to_string());
        }
        if self.cache_dir.trim_matches('/').is_empty() {
            return Err("Cache directory cannot be empty".to_string());
        }
        if self.cache_dir.split('/').any(|part| part == "..") {
            return Err(format!(
                "Cache directory must stay inside the storage root: {}",
                self.cache_dir
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default)]
    pub strategy: CacheFileStrategy,

    #[serde(default)]
    pub pre_cache_on_create: bool,
}

impl LifecycleConfig {
    pub fn policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            strategy: self.strategy,
            pre_cache_on_create: self.pre_cache_on_create,
        }
    }
}

/// One configured generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecConfig {
    pub kind: GeneratorKind,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default)]
    pub format: Option<ImageFormat>,

    #[serde(default)]
    pub pre_cache: bool,
}

impl SpecConfig {
    pub fn passthrough() -> Self {
        Self {
            kind: GeneratorKind::Passthrough,
            width: None,
            height: None,
            format: None,
            pre_cache: false,
        }
    }

    fn dimensions(&self) -> Result<(u32, u32), String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => Err(format!(
                "{:?} specs need a positive width and height",
                self.kind
            )),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.kind {
            GeneratorKind::Passthrough => Ok(()),
            GeneratorKind::Resize | GeneratorKind::Thumbnail => self.dimensions().map(|_| ()),
        }
    }

    pub fn to_generator(&self) -> Result<Arc<dyn Generator>, String> {
        let format = self.format.unwrap_or_default();
        Ok(match self.kind {
            GeneratorKind::Passthrough => Arc::new(Passthrough),
            GeneratorKind::Resize => {
                let (width, height) = self.dimensions()?;
                Arc::new(Resize {
                    width,
                    height,
                    format,
                })
            }
            GeneratorKind::Thumbnail => {
                let (width, height) = self.dimensions()?;
                Arc::new(Thumbnail {
                    width,
                    height,
                    format,
                })
            }
        })
    }

    pub fn to_descriptor(&self, id: &str) -> Result<GeneratorDescriptor, ApiError> {
        let generator = self
            .to_generator()
            .map_err(|e| ApiError::ConfigError(format!("Spec '{}': {}", id, e)))?;
        Ok(GeneratorDescriptor::new(id, generator).with_pre_cache(self.pre_cache))
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Cache(String),
    Storage(String),
    Spec(String, String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Cache(msg) => write!(f, "Cache: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Spec(id, msg) => write!(f, "Spec '{}': {}", id, msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CacheKitConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.cache.validate() {
            errors.push(ValidationError::Cache(e));
        }
        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }
        for (id, spec) in &self.specs {
            if let Err(e) = validate_id(id) {
                errors.push(ValidationError::Spec(id.clone(), e.to_string()));
            }
            if let Err(e) = spec.validate() {
                errors.push(ValidationError::Spec(id.clone(), e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`CacheKitConfig::validate`] folded into one `ApiError`
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    pub fn orchestrator(&self, workspace_root: &Path) -> Result<GenerationOrchestrator, ApiError> {
        let cache = self.cache.open(workspace_root)?;
        Ok(GenerationOrchestrator::new(cache, self.cache.key_builder()).with_ttl(self.cache.ttl()))
    }
}

fn resolve(workspace_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}
