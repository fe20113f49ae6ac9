use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::repos::BlobStore;

/// [`BlobStore`] keeping each blob as a file under a root directory
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open the store, creating the root directory if needed
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        tracing::info!("Blob storage at: {:?}", root);
        Ok(Self { root })
    }

    /// Map a storage path onto the filesystem, refusing anything that could
    /// escape the root
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !valid {
            tracing::warn!("Rejected storage path: {:?}", path);
            return Err(AppError::InvalidInput(format!("Invalid storage path: {}", path)));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put_new(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        let full = self.resolve(path)?;

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    AppError::Storage(format!("Blob already exists: {}", path))
                }
                _ => AppError::Storage(format!("Failed to create blob {}: {}", path, e)),
            })?;

        file.write_all(&bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write blob {}: {}", path, e)))?;
        file.flush().await?;

        tracing::debug!("Stored blob {} ({} bytes)", path, bytes.len());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;

        tokio::fs::read(&full).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::BlobNotFound(path.to_string()),
            _ => AppError::Storage(format!("Failed to read blob {}: {}", path, e)),
        })
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;

        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Blob {} already absent", path);
                Ok(())
            }
            Err(e) => Err(AppError::Storage(format!(
                "Failed to remove blob {}: {}",
                path, e
            ))),
        }
    }
}
