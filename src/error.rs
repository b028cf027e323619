//! Error types for the cachekit generation engine.

use thiserror::Error;

/// Storage collaborator errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Artifact not found in storage: {0}")]
    NotFound(String),

    #[error("Invalid storage name: {0}")]
    InvalidName(String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generation cache backend errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Corrupt cache entry for key {key}: {message}")]
    CorruptEntry { key: String, message: String },
}

/// Malformed identifier patterns. Raised before any generation work begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Bad pattern {pattern:?}: {count} consecutive '*' at offset {position} (use '*' or '**')")]
    RepeatedWildcard {
        pattern: String,
        position: usize,
        count: usize,
    },

    #[error("Bad pattern {pattern:?}: {message}")]
    Compile { pattern: String, message: String },
}

/// Failures raised by a single artifact's generation step
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No source associated with artifact")]
    MissingSource,

    #[error("Generator failed: {0:#}")]
    Generator(anyhow::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Spec registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid generator id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Generator already registered: {0}")]
    DuplicateId(String),

    #[error("Unknown generator id: {0}")]
    UnknownId(String),

    #[error("Spec registry already initialized")]
    AlreadyInitialized,
}

/// Lifecycle binding errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Record type {record_type} has no accessor named {accessor}")]
    UnknownAccessor {
        record_type: String,
        accessor: String,
    },

    #[error("Record type {record_type} maps to unregistered generator {generator_id}")]
    UnknownGenerator {
        record_type: String,
        generator_id: String,
    },
}

/// Top-level errors surfaced to CLI callers and embedders
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Pattern(#[from] PatternError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Cache error: {0}")]
    CacheError(#[from] CacheError),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Output error: {0}")]
    OutputError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
