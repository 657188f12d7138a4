//! Backup artifact intake and storage.
//!
//! The backup path is fully decoupled from alert correlation: storage nodes
//! accept repeated uploads with distinct names and no prior registration.
//! Blobs land under one directory per client as `{timestamp}_{filename}`.

use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from artifact storage.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// A name component would escape the storage root.
    #[error("invalid artifact name component: {0}")]
    InvalidName(String),

    /// The blob could not be written.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receipt for a stored artifact.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Client the artifact belongs to.
    pub client_id: String,
    /// Name the blob was stored under, relative to the client directory.
    pub stored_name: String,
    /// Size of the stored blob in bytes.
    pub size: usize,
    /// SHA-256 digest of the stored bytes, lowercase hex.
    pub sha256: String,
}

/// Accepts named binary blobs for safekeeping.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores one blob. Re-uploading the same name overwrites the previous
    /// content.
    async fn store(
        &self,
        client_id: &str,
        timestamp: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StoredArtifact, ArtifactError>;
}

/// Filesystem-backed artifact store.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Creates a store rooted at `root`. Directories are created lazily on
    /// first upload.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Rejects name components that could traverse outside the storage root.
fn checked_component(value: &str) -> Result<&str, ArtifactError> {
    if value.is_empty()
        || value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0')
    {
        return Err(ArtifactError::InvalidName(value.to_string()));
    }
    Ok(value)
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn store(
        &self,
        client_id: &str,
        timestamp: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StoredArtifact, ArtifactError> {
        let client_dir = self.root.join(checked_component(client_id)?);
        checked_component(timestamp)?;
        checked_component(filename)?;

        tokio::fs::create_dir_all(&client_dir).await?;

        let stored_name = format!("{timestamp}_{filename}");
        let path = client_dir.join(&stored_name);
        tokio::fs::write(&path, bytes).await?;

        let sha256 = hex::encode(Sha256::digest(bytes));
        tracing::info!(
            client_id,
            stored_name = %stored_name,
            size = bytes.len(),
            "Stored backup artifact."
        );

        Ok(StoredArtifact {
            client_id: client_id.to_string(),
            stored_name,
            size: bytes.len(),
            sha256,
        })
    }
}
