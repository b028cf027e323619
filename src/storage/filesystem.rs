//! Filesystem storage
//!
//! Stores artifacts below a root directory. Writes go to a uniquely named
//! temporary file next to the target and are renamed into place on commit, so
//! concurrent writers of the same artifact end in an idempotent overwrite and
//! readers never observe a partial file.

use crate::error::StorageError;
use crate::storage::{join_url, ArtifactStore, StorageSink};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct FileSystemStorage {
    root: PathBuf,
    base_url: String,
}

impl FileSystemStorage {
    /// Create storage rooted at `root`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(root: P, base_url: impl Into<String>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to create storage root at {:?}: {}", root, e),
            ))
        })?;
        Ok(Self {
            root,
            base_url: base_url.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage name to a path below the root
    ///
    /// Rejects empty names, absolute names and any `..` component.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        let trimmed = name.trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        let relative = Path::new(trimmed);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn dir_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        if name.trim_matches('/').is_empty() {
            Ok(self.root.clone())
        } else {
            self.path_for(name)
        }
    }
}

impl ArtifactStore for FileSystemStorage {
    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.path_for(name)?.is_file())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to read {:?}: {}", path, e),
            )),
        })
    }

    fn open_write(&self, name: &str) -> Result<Box<dyn StorageSink>, StorageError> {
        let target = self.path_for(name)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::IoError(io::Error::new(
                    e.kind(),
                    format!("Failed to create parent directory {:?}: {}", parent, e),
                ))
            })?;
        }

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::InvalidName(name.to_string()))?;
        let temp = target.with_file_name(format!(
            ".{}.{}-{}.tmp",
            file_name,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let file = fs::File::create(&temp).map_err(|e| {
            StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to create temp file {:?}: {}", temp, e),
            ))
        })?;

        Ok(Box::new(FileSink {
            writer: Some(BufWriter::new(file)),
            temp,
            target,
        }))
    }

    fn url(&self, name: &str) -> String {
        join_url(&self.base_url, name)
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to delete {:?}: {}", path, e),
            ))),
        }
    }

    fn remove_empty_dirs(&self, name: &str, stop_at: &str) -> Result<(), StorageError> {
        let stop = self.dir_for(stop_at)?;
        let path = self.path_for(name)?;

        let mut current = path.parent().map(Path::to_path_buf);
        let mut leaf = true;
        while let Some(dir) = current {
            if dir == stop || !dir.starts_with(&stop) {
                break;
            }
            if dir.exists() {
                if fs::read_dir(&dir)?.next().is_some() {
                    if leaf {
                        return Err(StorageError::DirectoryNotEmpty(dir.display().to_string()));
                    }
                    break;
                }
                fs::remove_dir(&dir)?;
            }
            leaf = false;
            current = dir.parent().map(Path::to_path_buf);
        }
        Ok(())
    }
}

/// Temp-file sink; renamed over the target on commit, removed on drop otherwise.
struct FileSink {
    writer: Option<BufWriter<fs::File>>,
    temp: PathBuf,
    target: PathBuf,
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink already closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl StorageSink for FileSink {
    fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| StorageError::Backend("sink already closed".to_string()))?;
        let file = writer.into_inner().map_err(|e| {
            StorageError::IoError(io::Error::new(
                e.error().kind(),
                format!("Failed to flush {:?}: {}", self.temp, e.error()),
            ))
        })?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.temp, &self.target).map_err(|e| {
            StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to rename temp file to {:?}: {}", self.target, e),
            ))
        })?;
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Committed sinks have already moved the temp file.
        self.writer.take();
        let _ = fs::remove_file(&self.temp);
    }
}
