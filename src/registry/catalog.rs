//! Record catalogs: the persistence collaborator's view of which records exist.

use crate::artifact::SourceRecord;
use crate::error::StorageError;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Enumerates the records a generator should produce artifacts for.
///
/// Called afresh on every artifact query; implementations must not assume
/// results are cached.
pub trait RecordCatalog: Send + Sync {
    fn records(&self) -> Result<Vec<SourceRecord>, StorageError>;
}

/// Mutable in-process record list
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    records: RwLock<Vec<SourceRecord>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = SourceRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
        }
    }

    /// Insert or replace the record with the same key
    pub fn insert(&self, record: SourceRecord) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.key == record.key) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    pub fn remove(&self, key: &str) -> Option<SourceRecord> {
        let mut records = self.records.write();
        let index = records.iter().position(|r| r.key == key)?;
        Some(records.remove(index))
    }

    pub fn get(&self, key: &str) -> Option<SourceRecord> {
        self.records.read().iter().find(|r| r.key == key).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordCatalog for MemoryCatalog {
    fn records(&self) -> Result<Vec<SourceRecord>, StorageError> {
        Ok(self.records.read().clone())
    }
}

/// Treats every image file under a storage directory as a record whose key and
/// source are its storage name.
///
/// Hidden files and the excluded prefixes (normally the cache directory) are
/// skipped. Results are sorted by name.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
    source_dir: String,
    exclude: Vec<String>,
    extensions: Vec<String>,
}

impl DirectoryCatalog {
    /// `root` is the storage root; `source_dir` is relative to it
    pub fn new<P: AsRef<Path>>(root: P, source_dir: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            source_dir: source_dir.into().trim_matches('/').to_string(),
            exclude: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Skip storage names under `prefix`
    pub fn exclude(mut self, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        self.exclude.push(prefix.trim_matches('/').to_string());
        self
    }

    /// Only accept these extensions (case-insensitive, without dot)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude
            .iter()
            .any(|prefix| !prefix.is_empty() && (name == prefix || name.starts_with(&format!("{}/", prefix))))
    }

    fn accepts_extension(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        name.rsplit_once('.')
            .map(|(_, ext)| self.extensions.contains(&ext.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    fn storage_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl RecordCatalog for DirectoryCatalog {
    fn records(&self) -> Result<Vec<SourceRecord>, StorageError> {
        let dir = if self.source_dir.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&self.source_dir)
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let walker = WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let hidden = entry.depth() > 0
                    && entry.file_name().to_string_lossy().starts_with('.');
                let excluded = self
                    .storage_name(entry.path())
                    .is_some_and(|name| self.is_excluded(&name));
                !hidden && !excluded
            });

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = self.storage_name(entry.path()) else {
                continue;
            };
            if self.accepts_extension(&name) {
                records.push(SourceRecord::new(name.clone(), name));
            }
        }

        Ok(records)
    }
}
