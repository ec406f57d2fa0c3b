//! Versioned JSON documents under `<config>/.storage/`
//!
//! Every document is wrapped as `{"version", "minor_version", "key", "data"}`.
//! Minor versions are compatible; a different major version refuses to load.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{key} has version {found}, only {expected} is supported")]
    VersionMismatch {
        key: String,
        expected: u32,
        found: u32,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Version stamp of one storage document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageVersion {
    pub major: u32,
    pub minor: u32,
}

#[derive(Serialize, Deserialize)]
struct Document<T> {
    version: u32,
    minor_version: u32,
    key: String,
    data: T,
}

#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Storage rooted at `config_dir/.storage`
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: config_dir.as_ref().join(".storage"),
        }
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Read the data stored under `key`, `None` when nothing was saved yet
    #[instrument(skip(self))]
    pub async fn read<T: DeserializeOwned>(
        &self,
        key: &str,
        version: StorageVersion,
    ) -> StorageResult<Option<T>> {
        let raw = match fs::read_to_string(self.path(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let document: Document<T> = serde_json::from_str(&raw)?;
        if document.version != version.major {
            return Err(StorageError::VersionMismatch {
                key: key.to_string(),
                expected: version.major,
                found: document.version,
            });
        }
        debug!(minor = document.minor_version, "Read storage document");
        Ok(Some(document.data))
    }

    /// Replace the document under `key`; readers never see a partial file
    #[instrument(skip(self, data))]
    pub async fn write<T: Serialize>(
        &self,
        key: &str,
        version: StorageVersion,
        data: &T,
    ) -> StorageResult<()> {
        let document = Document {
            version: version.major,
            minor_version: version.minor,
            key: key.to_string(),
            data,
        };
        let json = serde_json::to_vec_pretty(&document)?;

        fs::create_dir_all(&self.dir).await?;
        let staging = self.path(&format!("{}.tmp", key));
        fs::write(&staging, json).await?;
        fs::rename(&staging, self.path(key)).await?;
        debug!("Wrote storage document");
        Ok(())
    }
}
