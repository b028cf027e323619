//! Artifact storage
//!
//! The storage collaborator contract: existence checks, reads, committed writes,
//! public URLs, deletion and best-effort directory pruning. Names are
//! `/`-separated paths relative to the storage root.

pub mod filesystem;
pub mod memory;

pub use filesystem::FileSystemStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;
use std::io::Write;

/// Writable handle returned by [`ArtifactStore::open_write`].
///
/// Bytes become visible under the target name only on `commit`. Dropping a sink
/// without committing discards everything written to it.
pub trait StorageSink: Write + Send {
    fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

/// Storage backend for source images and generated artifacts
pub trait ArtifactStore: Send + Sync {
    fn exists(&self, name: &str) -> Result<bool, StorageError>;

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    fn open_write(&self, name: &str) -> Result<Box<dyn StorageSink>, StorageError>;

    fn url(&self, name: &str) -> String;

    /// Delete `name`. Deleting a missing name is not an error.
    fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Remove the now-empty directories containing `name`, walking upwards and
    /// stopping before `stop_at` or at the first ancestor that still has
    /// entries. Fails with `DirectoryNotEmpty` when the directory directly
    /// containing `name` is not empty. Backends without directories do nothing.
    fn remove_empty_dirs(&self, _name: &str, _stop_at: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Write `bytes` to `name` through a committed sink.
pub fn save(store: &dyn ArtifactStore, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
    let mut sink = store.open_write(name)?;
    sink.write_all(bytes)?;
    sink.commit()
}

/// Parent directory of a `/`-separated name, if any.
pub fn parent_dir(name: &str) -> Option<&str> {
    name.rsplit_once('/').map(|(dir, _)| dir)
}

pub(crate) fn join_url(base_url: &str, name: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}
