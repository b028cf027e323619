//! In-memory storage, for tests and for embedding the engine without a disk.

use crate::error::StorageError;
use crate::storage::{join_url, ArtifactStore, StorageSink};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Files {
    contents: BTreeMap<String, Vec<u8>>,
    writes: HashMap<String, usize>,
}

pub struct MemoryStorage {
    base_url: String,
    files: Arc<RwLock<Files>>,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            files: Arc::new(RwLock::new(Files::default())),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Store `bytes` directly, bypassing the write counter
    pub fn insert(&self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.files
            .write()
            .contents
            .insert(name.to_string(), bytes.into());
    }

    /// Number of committed writes to `name`
    pub fn write_count(&self, name: &str) -> usize {
        self.files.read().writes.get(name).copied().unwrap_or(0)
    }

    /// Total committed writes across all names
    pub fn total_writes(&self) -> usize {
        self.files.read().writes.values().sum()
    }

    /// Simulate an unreachable backend: every operation fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("storage unavailable".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("/media/")
    }
}

impl ArtifactStore for MemoryStorage {
    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        self.check_available()?;
        Ok(self.files.read().contents.contains_key(name))
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.check_available()?;
        self.files
            .read()
            .contents
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn open_write(&self, name: &str) -> Result<Box<dyn StorageSink>, StorageError> {
        self.check_available()?;
        if name.is_empty() {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(Box::new(MemorySink {
            name: name.to_string(),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }

    fn url(&self, name: &str) -> String {
        join_url(&self.base_url, name)
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.files.write().contents.remove(name);
        Ok(())
    }

    fn remove_empty_dirs(&self, name: &str, stop_at: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let stop = stop_at.trim_end_matches('/');
        let files = self.files.read();

        let mut dir = crate::storage::parent_dir(name);
        let mut leaf = true;
        while let Some(current) = dir {
            if current == stop || !current.starts_with(stop) {
                break;
            }
            let prefix = format!("{}/", current);
            if files.contents.keys().any(|k| k.starts_with(&prefix)) {
                if leaf {
                    return Err(StorageError::DirectoryNotEmpty(current.to_string()));
                }
                break;
            }
            leaf = false;
            dir = crate::storage::parent_dir(current);
        }
        Ok(())
    }
}

struct MemorySink {
    name: String,
    buffer: Vec<u8>,
    files: Arc<RwLock<Files>>,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StorageSink for MemorySink {
    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemorySink {
            name,
            buffer,
            files,
        } = *self;
        let mut files = files.write();
        *files.writes.entry(name.clone()).or_insert(0) += 1;
        files.contents.insert(name, buffer);
        Ok(())
    }
}
