//! Local filesystem state store implementation.

use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use tokio::fs;

use super::{StateStore, StorageError, StorageResult};

/// File-backed store writing one JSON file per key under a base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Base directory for state files.
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new file store rooted at the given directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the file path for a storage key.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        let sanitized = sanitize_key(key)?;
        Ok(self.base_path.join(format!("{}.json", sanitized)))
    }

    /// Ensure the base directory exists.
    async fn ensure_base_dir(&self) -> StorageResult<()> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).await?;
        }
        Ok(())
    }
}

/// Map a storage key to a filesystem-safe name.
///
/// Keys are namespace-prefixed wallet addresses ("entitlement:0xabc..."), so
/// only the separator needs replacing; anything that would escape the base
/// directory is rejected.
fn sanitize_key(key: &str) -> StorageResult<String> {
    if key.is_empty() || key.contains('/') || key.contains("..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(key.replace(':', "_"))
}

#[async_trait]
impl StateStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.ensure_base_dir().await?;
        let path = self.key_path(key)?;
        debug!("writing state file {}", path.display());
        fs::write(&path, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
