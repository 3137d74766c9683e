//! File-backed cache.
//!
//! The cache is a directory holding one file per key. Every read goes back to disk so
//! separate processes sharing the directory observe each other's writes. A write only
//! ever replaces its own entry file, through a temp file followed by a rename, so
//! writers touching different keys never interfere and a reader never sees a partial
//! value.

use super::{CacheError, PersistentCache};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the entry files
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(entry_file_name(key))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(
            ".{}.{}.tmp",
            entry_file_name(key),
            uuid::Uuid::new_v4()
        ))
    }
}

/// Map a key onto a file name that stays inside the cache directory.
///
/// ASCII letters, digits, `_` and `-` are kept; every other byte becomes `%XX`. Entry
/// names therefore never start with `.`, which is reserved for temp files.
fn entry_file_name(key: &str) -> String {
    if key.is_empty() {
        return "%".to_string();
    }

    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            name.push(byte as char);
        } else {
            let _ = write!(name, "%{:02X}", byte);
        }
    }
    name
}

#[async_trait]
impl PersistentCache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(key);
        match async_fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!(
                    "Cache entry {} is not valid UTF-8, treating as absent",
                    path.display()
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        async_fs::create_dir_all(&self.dir).await?;

        let temp_path = self.temp_path(key);
        let mut file = async_fs::File::create(&temp_path).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        let path = self.entry_path(key);
        if let Err(e) = async_fs::rename(&temp_path, &path).await {
            let _ = async_fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!("Wrote cache entry {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        match async_fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut entries = match async_fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            // temp files belong to writers that are still running
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            match async_fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!("Cleared {} cache entries from {}", removed, self.dir.display());
        Ok(())
    }

    fn cache_type(&self) -> &'static str {
        "file"
    }
}
